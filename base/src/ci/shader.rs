
use ash::vk;

use crate::context::VkDevice;
use crate::ci::{VulkanCI, VkObjectBuildableCI};
use crate::error::{VkResult, VkError};

use std::path::{Path, PathBuf};
use std::fs::File;
use std::ptr;

// ---------------------------------------------------------------------------------------------------
/// Wrapper class for vk::ShaderModuleCreateInfo, reading precompiled SPIR-V from a file.
#[derive(Debug, Clone)]
pub struct ShaderModuleCI {

    ci: vk::ShaderModuleCreateInfo,
    path: PathBuf,
}

impl VulkanCI<vk::ShaderModuleCreateInfo> for ShaderModuleCI {

    fn default_ci() -> vk::ShaderModuleCreateInfo {

        vk::ShaderModuleCreateInfo {
            s_type    : vk::StructureType::SHADER_MODULE_CREATE_INFO,
            p_next    : ptr::null(),
            flags     : vk::ShaderModuleCreateFlags::empty(),
            code_size : 0,
            p_code    : ptr::null(),
        }
    }
}

impl ShaderModuleCI {

    pub fn from_spirv(path: impl AsRef<Path>) -> ShaderModuleCI {

        ShaderModuleCI {
            ci: ShaderModuleCI::default_ci(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl VkObjectBuildableCI for ShaderModuleCI {
    type ObjectType = vk::ShaderModule;

    fn build(&self, device: &VkDevice) -> VkResult<vk::ShaderModule> {

        let codes = load_spirv(&self.path)?;

        let shader_module_ci = vk::ShaderModuleCreateInfo {
            // code_size is counted in bytes.
            code_size : codes.len() * 4,
            p_code    : codes.as_ptr(),
            ..self.ci
        };

        unsafe {
            device.logic.handle.create_shader_module(&shader_module_ci, None)
                .map_err(|e| VkError::api("Shader Module Creation", e))
        }
    }
}

/// Read SPIR-V words from `path`, checking the magic number.
pub fn load_spirv(path: impl AsRef<Path>) -> VkResult<Vec<u32>> {

    let path = path.as_ref();

    let mut file = File::open(path)
        .map_err(|_| VkError::path(path))?;
    ash::util::read_spv(&mut file)
        .map_err(|e| VkError::other(format!("Invalid SPIR-V file {:?}: {}", path, e)))
}
// ---------------------------------------------------------------------------------------------------
