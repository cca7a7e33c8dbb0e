
use ash::vk;
use raw_window_handle::RawDisplayHandle;

use crate::context::debug::ValidationConfig;
use crate::utils::cast::{chars2string, cstrings2ptrs};
use crate::error::{VkResult, VkError};
use crate::{vkuint, vkchar};

use std::ffi::CString;
use std::ptr;

/// The name of the validation layer shipped by the Vulkan SDK.
pub const VALIDATION_LAYER_NAME: &str = "VK_LAYER_KHRONOS_validation";

/// The configuration parameters used in the initialization of `vk::Instance`.
#[derive(Debug, Clone)]
pub struct InstanceConfig {

    /// `api_version` must be the highest version of Vulkan that the application is designed to use.
    pub api_version: vkuint,
    /// `application_version` is the developer-supplied version number of the application.
    pub application_version: vkuint,
    /// `engine_version` is the developer-supplied version number of the engine used to create the application.
    pub engine_version: vkuint,
    pub application_name: String,
    pub engine_name: String,
    /// log all available instance layers during creation.
    pub print_available_layers: bool,
}

impl Default for InstanceConfig {

    fn default() -> InstanceConfig {
       InstanceConfig {
           api_version         : vk::make_api_version(0, 1, 0, 0),
           application_version : vk::make_api_version(0, 1, 0, 0),
           engine_version      : vk::make_api_version(0, 0, 3, 0),
           application_name    : String::from("Vulkan Application"),
           engine_name         : String::from("vulkan-base"),
           print_available_layers: false,
       }
    }
}

/// Wrapper class for `vk::Instance` object.
pub struct VkInstance {

    /// handle of `vk::Instance`.
    pub(crate) handle: ash::Instance,
    /// the loaded Vulkan library.
    pub(crate) entry: ash::Entry,
    /// the names of vulkan layers enabled in instance creation.
    pub(crate) enable_layer_names: Vec<CString>,
}

impl VkInstance {

    /// Initialize `vk::Instance` object with the extensions required to present on `display`.
    pub fn new(config: InstanceConfig, validation: &ValidationConfig, display: RawDisplayHandle) -> VkResult<VkInstance> {

        let entry = unsafe {
            ash::Entry::load()
                .map_err(|_| VkError::unlink("Entry"))?
        };

        let app_name = CString::new(config.application_name.as_bytes())
            .map_err(|_| VkError::other("Failed to cast application name to CString."))?;
        let engine_name = CString::new(config.engine_name.as_bytes())
            .map_err(|_| VkError::other("Failed to cast engine name to CString."))?;

        let application_info = vk::ApplicationInfo {
            s_type              : vk::StructureType::APPLICATION_INFO,
            p_next              : ptr::null(),
            p_application_name  : app_name.as_ptr(),
            application_version : config.application_version,
            p_engine_name       : engine_name.as_ptr(),
            engine_version      : config.engine_version,
            api_version         : config.api_version,
        };

        let require_layers: Vec<&str> = if validation.is_enable {
            vec![VALIDATION_LAYER_NAME]
        } else {
            Vec::new()
        };

        if !is_all_instance_layer_support(&entry, config.print_available_layers, &require_layers)? {
            return Err(VkError::unsupported("Validation layer"))
        }

        let enable_layer_names = require_layers.iter()
            .map(|layer| CString::new(*layer))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VkError::other("Failed to cast instance layer name to CString."))?;
        let enable_layer_names_ptr = cstrings2ptrs(&enable_layer_names);
        let enable_extension_names = VkInstance::require_extensions(validation, display)?;

        let instance_ci = vk::InstanceCreateInfo {
            s_type                     : vk::StructureType::INSTANCE_CREATE_INFO,
            p_next                     : ptr::null(),
            flags                      : vk::InstanceCreateFlags::empty(),
            p_application_info         : &application_info,
            enabled_layer_count        : enable_layer_names_ptr.len() as _,
            pp_enabled_layer_names     : enable_layer_names_ptr.as_ptr(),
            enabled_extension_count    : enable_extension_names.len() as _,
            pp_enabled_extension_names : enable_extension_names.as_ptr(),
        };

        let handle = unsafe {
            entry.create_instance(&instance_ci, None)
                .map_err(|e| VkError::api("Instance Creation", e))?
        };

        log::info!("Vulkan instance created (validation: {}).", validation.is_enable);

        let instance = VkInstance { entry, handle, enable_layer_names };
        Ok(instance)
    }

    /// Collect the surface extensions of current platform and the debug extension if need.
    fn require_extensions(validation: &ValidationConfig, display: RawDisplayHandle) -> VkResult<Vec<*const vkchar>> {

        let surface_extensions = ash_window::enumerate_required_extensions(display)
            .map_err(|e| VkError::api("Enumerate Surface Extensions", e))?;

        let mut instance_extensions = surface_extensions.to_vec();
        if validation.is_enable {
            instance_extensions.push(ash::extensions::ext::DebugUtils::name().as_ptr());
        }

        Ok(instance_extensions)
    }

    /// Destroy the `vk::Instance` object.
    ///
    /// All child objects created using instance must have been destroyed prior to this call.
    pub(crate) fn discard(&self) {

        unsafe {
            self.handle.destroy_instance(None);
        }
    }
}

fn is_all_instance_layer_support(entry: &ash::Entry, print_available_layers: bool, required_layers: &[&str]) -> VkResult<bool> {

    let layer_properties = entry.enumerate_instance_layer_properties()
        .map_err(|e| VkError::api("Enumerate Instance Layers", e))?;

    let available_layer_names: Vec<String> = layer_properties.iter()
        .map(|available_layer| chars2string(&available_layer.layer_name))
        .collect();

    if print_available_layers {
        log::info!("Available instance layers: {:?}", available_layer_names);
    }

    let result = required_layers.iter().all(|required_layer| {
        let is_found = available_layer_names.iter().any(|available_layer| available_layer == required_layer);
        if !is_found {
            log::error!("Instance layer {} is not available.", required_layer);
        }
        is_found
    });

    Ok(result)
}
