
use ash::vk;

use crate::context::instance::VkInstance;
use crate::{vkptr, vkbool};
use crate::error::{VkResult, VkError};

use std::ffi::CStr;
use std::ptr;

/// The configuration of validation layer and its message callback.
#[derive(Debug, Clone)]
pub struct ValidationConfig {

    /// `is_enable` tell if validation layer should be enabled.
    pub is_enable: bool,
    /// which messages are forwarded to the logger.
    pub severity : vk::DebugUtilsMessageSeverityFlagsEXT,
    pub types    : vk::DebugUtilsMessageTypeFlagsEXT,
}

impl Default for ValidationConfig {

    fn default() -> ValidationConfig {
        ValidationConfig {
            is_enable: false,
            severity:
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING |
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            types:
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL |
                vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE |
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        }
    }
}

/// Wrapper class for the validation tools used in Vulkan.
pub struct VkDebugger {

    target: Option<VkDebugUtils>,
}

impl VkDebugger {

    pub fn new(instance: &VkInstance, config: &ValidationConfig) -> VkResult<VkDebugger> {

        let target = if config.is_enable {
            Some(VkDebugUtils::new(instance, config)?)
        } else {
            None
        };

        let result = VkDebugger { target };
        Ok(result)
    }

    pub fn discard(&self) {

        if let Some(ref utils) = self.target {
            unsafe {
                utils.loader.destroy_debug_utils_messenger(utils.utils_messenger, None);
            }
        }
    }
}

/// Forward the messages of validation layer to `log`.
unsafe extern "system" fn vulkan_debug_utils_callback(
    message_severity : vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type     : vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data  : *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data     : vkptr
) -> vkbool {

    let level = match message_severity {
        | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => log::Level::Trace,
        | vk::DebugUtilsMessageSeverityFlagsEXT::INFO    => log::Level::Info,
        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::Level::Warn,
        | _ => log::Level::Error,
    };
    let types = match message_type {
        | vk::DebugUtilsMessageTypeFlagsEXT::GENERAL     => "General",
        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "Performance",
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION  => "Validation",
        | _ => "Unknown",
    };

    if !p_callback_data.is_null() && !(*p_callback_data).p_message.is_null() {
        let message = CStr::from_ptr((*p_callback_data).p_message);
        log::log!(target: "vulkan", level, "[{}] {}", types, message.to_string_lossy());
    }

    vk::FALSE
}

struct VkDebugUtils {
    /// the extension loader of debug utils.
    loader: ash::extensions::ext::DebugUtils,
    /// the handle of callback function used in Validation Layer.
    utils_messenger: vk::DebugUtilsMessengerEXT,
}

impl VkDebugUtils {

    fn new(instance: &VkInstance, config: &ValidationConfig) -> VkResult<VkDebugUtils> {

        let loader = ash::extensions::ext::DebugUtils::new(&instance.entry, &instance.handle);

        let messenger_ci = vk::DebugUtilsMessengerCreateInfoEXT {
            s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
            p_next: ptr::null(),
            flags            : vk::DebugUtilsMessengerCreateFlagsEXT::empty(),
            message_severity : config.severity,
            message_type     : config.types,
            pfn_user_callback: Some(vulkan_debug_utils_callback),
            p_user_data      : ptr::null_mut(),
        };

        let utils_messenger = unsafe {
            loader.create_debug_utils_messenger(&messenger_ci, None)
                .map_err(|_| VkError::create("Debug Utils Callback"))?
        };

        let utils = VkDebugUtils { loader, utils_messenger };
        Ok(utils)
    }
}
