
use ash::vk;
use bytemuck::Pod;

use crate::error::{VkResult, VkError};

use std::ptr::NonNull;

/// A uniform buffer whose memory stays mapped into host address space for its whole lifetime.
///
/// Each frame slot owns one region, so the host only writes it while the slot's fence is signaled.
#[derive(Debug)]
pub struct UniformRegion {

    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    mapped: NonNull<u8>,
    size: usize,
}

impl UniformRegion {

    /// Wrap a buffer whose backing memory has been mapped at `mapped`.
    ///
    /// # Safety
    ///
    /// `mapped` must point to at least `size` writable bytes that remain valid until the region is destroyed.
    pub unsafe fn from_raw_parts(buffer: vk::Buffer, memory: vk::DeviceMemory, mapped: *mut u8, size: usize) -> VkResult<UniformRegion> {

        let mapped = NonNull::new(mapped)
            .ok_or_else(|| VkError::other("Mapped uniform memory must not be null."))?;

        let region = UniformRegion { buffer, memory, mapped, size };
        Ok(region)
    }

    #[inline]
    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    #[inline]
    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn descriptor(&self) -> vk::DescriptorBufferInfo {

        vk::DescriptorBufferInfo {
            buffer: self.buffer,
            offset: 0,
            range : self.size as vk::DeviceSize,
        }
    }

    /// Copy `data` to the start of the region.
    pub fn write<T: Pod>(&mut self, data: &T) -> VkResult<()> {
        self.write_bytes(bytemuck::bytes_of(data))
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> VkResult<()> {

        if bytes.len() > self.size {
            return Err(VkError::other(format!("Uniform data of {} bytes exceeds the region size of {} bytes.", bytes.len(), self.size)))
        }

        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped.as_ptr(), bytes.len());
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe {
            std::slice::from_raw_parts(self.mapped.as_ptr(), self.size)
        }
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mapped.as_ptr()
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    fn host_region(storage: &mut Vec<u8>) -> UniformRegion {
        unsafe {
            UniformRegion::from_raw_parts(vk::Buffer::null(), vk::DeviceMemory::null(), storage.as_mut_ptr(), storage.len())
                .unwrap()
        }
    }

    #[test]
    fn written_values_are_read_back() {

        let mut storage = vec![0_u8; 16];
        let mut region = host_region(&mut storage);

        let values = [1.0_f32, 2.0, 3.0, 4.0];
        region.write(&values).unwrap();

        let read_back: [f32; 4] = bytemuck::pod_read_unaligned(region.as_bytes());
        assert_eq!(read_back, values);
    }

    #[test]
    fn oversized_write_is_rejected() {

        let mut storage = vec![7_u8; 4];
        let mut region = host_region(&mut storage);

        assert!(region.write(&[0_u32; 2]).is_err());
        assert_eq!(region.as_bytes(), &[7, 7, 7, 7]);
    }

    #[test]
    fn descriptor_covers_whole_region() {

        let mut storage = vec![0_u8; 192];
        let region = host_region(&mut storage);

        let descriptor = region.descriptor();
        assert_eq!(descriptor.offset, 0);
        assert_eq!(descriptor.range, 192);
    }

    #[test]
    fn null_mapping_is_rejected() {

        let region = unsafe {
            UniformRegion::from_raw_parts(vk::Buffer::null(), vk::DeviceMemory::null(), std::ptr::null_mut(), 16)
        };
        assert!(region.is_err());
    }
}
