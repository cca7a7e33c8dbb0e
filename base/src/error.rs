
use ash::vk;
use failure::{ Backtrace, Context, Fail };

use std::result;
use std::path::{ Path, PathBuf };
use std::fmt;

pub type VkResult<T> = result::Result<T, VkError>;

// -------------------------------------------------------------------------------------------
#[derive(Debug)]
pub struct VkError {

    ctx: Context<VkErrorKind>,
}

impl VkError {

    pub fn kind(&self) -> &VkErrorKind {
        self.ctx.get_context()
    }

    /// Return true if the caller may retry the same operation on a later loop tick.
    ///
    /// Only timeouts are considered recoverable, everything else must be handled by the caller.
    pub fn is_recoverable(&self) -> bool {
        match self.kind() {
            | VkErrorKind::Timeout { .. } => true,
            | _ => false,
        }
    }

    pub fn unlink(target: &'static str) -> VkError {
        VkError::from(VkErrorKind::Unlink { target })
    }

    pub fn query(target: &'static str) -> VkError {
        VkError::from(VkErrorKind::Query { target })
    }

    pub fn create(target: &'static str) -> VkError {
        VkError::from(VkErrorKind::Create { target })
    }

    pub fn unsupported(feature: &'static str) -> VkError {
        VkError::from(VkErrorKind::UnSupport { feature })
    }

    /// An error returned by a Vulkan call, keeping the raw status code.
    pub fn api(ops: &'static str, result: vk::Result) -> VkError {
        VkError::from(VkErrorKind::Api { ops, result })
    }

    pub fn timeout(ops: &'static str) -> VkError {
        VkError::from(VkErrorKind::Timeout { ops })
    }

    pub fn memory_type(type_bits: u32, properties: vk::MemoryPropertyFlags) -> VkError {
        VkError::from(VkErrorKind::MemoryType { type_bits, properties })
    }

    pub(crate) fn window(description: impl AsRef<str>) -> VkError {
        VkError::from(VkErrorKind::Window { description: description.as_ref().to_string() })
    }

    /// A convenience routine for creating an error associated with a path.
    pub fn path(path: impl AsRef<Path>)-> VkError {
        VkError::from(VkErrorKind::Path { path: path.as_ref().to_path_buf() })
    }

    pub fn other(description: impl AsRef<str>) -> VkError {
        VkError::from(VkErrorKind::Other {
            description: description.as_ref().to_string()
        })
    }
}

impl Fail for VkError {

    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for VkError {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.ctx, f)
    }
}
// -------------------------------------------------------------------------------------------

// -------------------------------------------------------------------------------------------
/// The specific kind of error that can occur.
#[derive(Debug, Fail)]
pub enum VkErrorKind {

    /// An error occurred while building connection between application and Vulkan.
    #[fail(display = "Failed to bridge connection between {} and Vulkan.", target)]
    Unlink { target: &'static str },
    /// An error occurred while querying some properties from Vulkan.
    #[fail(display = "Failed to query {} property from Vulkan or Device.", target)]
    Query { target: &'static str },
    /// An error occurred while creating Vulkan Object.
    #[fail(display = "Failed to create {}.", target)]
    Create { target: &'static str },
    /// An error indicated requiring some unsupported feature.
    #[fail(display = "Feature {} is not supported in current Vulkan Device.", feature)]
    UnSupport { feature: &'static str },
    /// A Vulkan call returned a failure status.
    #[fail(display = "{} failed with {}.", ops, result)]
    Api { ops: &'static str, result: vk::Result },
    /// A bounded wait expired before the GPU signaled.
    #[fail(display = "{} timed out.", ops)]
    Timeout { ops: &'static str },
    /// No memory type matches the requirement of a resource.
    #[fail(display = "No memory type in bits {:#b} supports {:?}.", type_bits, properties)]
    MemoryType { type_bits: u32, properties: vk::MemoryPropertyFlags },
    /// An error occurred while communicate with Window.
    #[fail(display = "Failed to interact with Window: {}.", description)]
    Window { description: String },
    /// An error that occurred while working with a file path.
    #[fail(display = "Failed to locate file at: {:?}", path)]
    Path { path: PathBuf },
    /// Other errors.
    #[fail(display = "{}", description)]
    Other { description: String },
}

impl From<VkErrorKind> for VkError {

    fn from(kind: VkErrorKind) -> VkError {
        VkError::from(Context::new(kind))
    }
}

impl From<Context<VkErrorKind>> for VkError {

    fn from(ctx: Context<VkErrorKind>) -> VkError {
        VkError { ctx }
    }
}
// -------------------------------------------------------------------------------------------


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn only_timeouts_are_recoverable() {

        assert!(VkError::timeout("Fence waiting").is_recoverable());

        assert!(!VkError::api("Queue Submit", vk::Result::ERROR_DEVICE_LOST).is_recoverable());
        assert!(!VkError::create("Fence").is_recoverable());
        assert!(!VkError::memory_type(0b0110, vk::MemoryPropertyFlags::HOST_VISIBLE).is_recoverable());
    }

    #[test]
    fn api_error_carries_operation_and_status() {

        let error = VkError::api("Acquire Next Image", vk::Result::ERROR_SURFACE_LOST_KHR);

        match error.kind() {
            | VkErrorKind::Api { ops, result } => {
                assert_eq!(*ops, "Acquire Next Image");
                assert_eq!(*result, vk::Result::ERROR_SURFACE_LOST_KHR);
            },
            | _ => panic!("unexpected error kind: {:?}", error.kind()),
        }

        let message = error.to_string();
        assert!(message.starts_with("Acquire Next Image failed with"));
    }

    #[test]
    fn memory_type_error_names_the_requirement() {

        let message = VkError::memory_type(0b101, vk::MemoryPropertyFlags::DEVICE_LOCAL).to_string();
        assert!(message.contains("0b101"));
        assert!(message.contains("DEVICE_LOCAL"));
    }
}
