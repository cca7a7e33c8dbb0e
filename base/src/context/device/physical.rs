
use ash::vk;

use crate::context::instance::VkInstance;
use crate::utils::cast::{chars2string, chars2cstring};
use crate::error::{VkResult, VkError};

use std::ffi::CString;


#[derive(Debug, Clone)]
pub struct PhysicalDevConfig {

    /// devices of this type are tried first.
    pub device_type_preference: vk::PhysicalDeviceType,
    /// device extensions that must be supported by the selected device.
    pub request_extensions: Vec<CString>,
    pub request_features: vk::PhysicalDeviceFeatures,
    /// log the extensions of each candidate device.
    pub print_available_extensions: bool,
}

impl Default for PhysicalDevConfig {

    fn default() -> PhysicalDevConfig {

        PhysicalDevConfig {
            device_type_preference: vk::PhysicalDeviceType::DISCRETE_GPU,
            request_extensions: vec![
                CString::from(ash::extensions::khr::Swapchain::name()),
            ],
            request_features: vk::PhysicalDeviceFeatures::default(),
            print_available_extensions: false,
        }
    }
}

pub struct VkPhysicalDevice {

    pub handle: vk::PhysicalDevice,
    pub memories: vk::PhysicalDeviceMemoryProperties,
    pub depth_format: vk::Format,
    pub limits: vk::PhysicalDeviceLimits,

    config: PhysicalDevConfig,
}

struct PhyDeviceCandidate {

    handle: vk::PhysicalDevice,
    property: vk::PhysicalDeviceProperties,
}

impl VkPhysicalDevice {

    pub(crate) fn new(instance: &VkInstance, config: PhysicalDevConfig) -> VkResult<VkPhysicalDevice> {

        let candidates = query_candidates(instance, &config)?;

        let mut selected = None;
        for candidate in candidates.into_iter() {
            if is_all_extension_support(instance, &candidate, &config)? {
                selected = Some(candidate);
                break
            }
        }

        let candidate = selected
            .ok_or_else(|| VkError::other("Failed to find a Vulkan device supporting all requested extensions."))?;

        log_device_properties(&candidate.property);

        let memories = unsafe {
            instance.handle.get_physical_device_memory_properties(candidate.handle)
        };
        let depth_format = query_depth_format(instance, candidate.handle)?;

        let dst_device = VkPhysicalDevice {
            handle: candidate.handle,
            limits: candidate.property.limits,
            config, memories, depth_format,
        };
        Ok(dst_device)
    }

    pub fn enable_features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.config.request_features
    }

    pub fn enable_extensions(&self) -> &[CString] {
        &self.config.request_extensions
    }
}

fn query_candidates(instance: &VkInstance, config: &PhysicalDevConfig) -> VkResult<Vec<PhyDeviceCandidate>> {

    let handles = unsafe {
        instance.handle.enumerate_physical_devices()
            .map_err(|e| VkError::api("Enumerate Physical Devices", e))?
    };

    let mut candidates: Vec<PhyDeviceCandidate> = handles.into_iter().map(|handle| {
        let property = unsafe {
            instance.handle.get_physical_device_properties(handle)
        };
        PhyDeviceCandidate { handle, property }
    }).collect();

    // stable sort keeps the enumeration order among devices of the same rank.
    candidates.sort_by_key(|candidate| candidate.property.device_type != config.device_type_preference);

    Ok(candidates)
}

fn is_all_extension_support(instance: &VkInstance, candidate: &PhyDeviceCandidate, config: &PhysicalDevConfig) -> VkResult<bool> {

    let query_extensions = unsafe {
        instance.handle.enumerate_device_extension_properties(candidate.handle)
            .map_err(|e| VkError::api("Enumerate Device Extensions", e))?
    };

    let available_extensions: Vec<CString> = query_extensions.iter()
        .map(|extension| chars2cstring(&extension.extension_name))
        .collect();

    if config.print_available_extensions {
        log::info!("Available extensions for {}: {:?}", chars2string(&candidate.property.device_name), available_extensions);
    }

    let result = config.request_extensions.iter().all(|request_extension| {
        available_extensions.contains(request_extension)
    });
    Ok(result)
}

fn log_device_properties(property: &vk::PhysicalDeviceProperties) {

    let device_type = match property.device_type {
        | vk::PhysicalDeviceType::CPU            => "CPU",
        | vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
        | vk::PhysicalDeviceType::DISCRETE_GPU   => "Discrete GPU",
        | vk::PhysicalDeviceType::VIRTUAL_GPU    => "Virtual GPU",
        | _ => "Unknown",
    };

    log::info!("Using device: {} ({}), API version {}.{}.{}",
        chars2string(&property.device_name), device_type,
        vk::api_version_major(property.api_version),
        vk::api_version_minor(property.api_version),
        vk::api_version_patch(property.api_version));
}

fn query_depth_format(instance: &VkInstance, phy_device: vk::PhysicalDevice) -> VkResult<vk::Format> {

    // all depth formats may be optional, start with the highest precision packed format.
    let candidates = [
        vk::Format::D32_SFLOAT_S8_UINT,
        vk::Format::D32_SFLOAT,
        vk::Format::D24_UNORM_S8_UINT,
        vk::Format::D16_UNORM_S8_UINT,
        vk::Format::D16_UNORM,
    ];

    candidates.iter().cloned().find(|&format| {
        let format_properties = unsafe {
            instance.handle.get_physical_device_format_properties(phy_device, format)
        };
        format_properties.optimal_tiling_features.contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    }).ok_or(VkError::unsupported("Depth Stencil Format"))
}
