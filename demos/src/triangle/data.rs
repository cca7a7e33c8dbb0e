
use ash::vk;
use bytemuck::{Pod, Zeroable};

use vkbase::context::VkDevice;
use vkbase::ci::buffer::{BufferCI, bind_buffer_memory};
use vkbase::ci::memory::MemoryAI;
use vkbase::utils::time::VkTimeDuration;
use vkbase::{VkResult, VkError};
use vkbase::{vkuint, vkbytes, Mat4F};

use crate::helper;

use std::mem;
use std::ptr;

/// Vertex layout used in this example.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    position: [f32; 3],
    color: [f32; 3],
}

pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex { position: [ 1.0,  1.0, 0.0], color: [1.0, 0.0, 0.0] },
    Vertex { position: [-1.0,  1.0, 0.0], color: [0.0, 1.0, 0.0] },
    Vertex { position: [ 0.0, -1.0, 0.0], color: [0.0, 0.0, 1.0] },
];

pub const TRIANGLE_INDICES: [vkuint; 3] = [0, 1, 2];

pub struct InputDescriptionStaff {
    pub bindings  : Vec<vk::VertexInputBindingDescription>,
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
    pub state: vk::PipelineVertexInputStateCreateInfo,
}

impl Vertex {

    pub fn input_description() -> InputDescriptionStaff {

        // This example uses a single vertex input binding at binding point 0 (see vkCmdBindVertexBuffers).
        let input_bindings = vec![
            vk::VertexInputBindingDescription {
                binding: 0,
                stride : mem::size_of::<Vertex>() as _,
                input_rate: vk::VertexInputRate::VERTEX,
            },
        ];

        let vertex_input_attributes = vec![
            // layout (location = 0) in vec3 inPos;
            vk::VertexInputAttributeDescription {
                location: 0,
                binding : 0,
                format  : vk::Format::R32G32B32_SFLOAT,
                offset  : memoffset::offset_of!(Vertex, position) as _,
            },
            // layout (location = 1) in vec3 inColor;
            vk::VertexInputAttributeDescription {
                location: 1,
                binding : 0,
                format  : vk::Format::R32G32B32_SFLOAT,
                offset  : memoffset::offset_of!(Vertex, color) as _,
            },
        ];

        let input_state = vk::PipelineVertexInputStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_VERTEX_INPUT_STATE_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::PipelineVertexInputStateCreateFlags::empty(),
            vertex_binding_description_count: input_bindings.len() as _,
            p_vertex_binding_descriptions   : input_bindings.as_ptr(),
            vertex_attribute_description_count: vertex_input_attributes.len() as _,
            p_vertex_attribute_descriptions   : vertex_input_attributes.as_ptr(),
        };

        InputDescriptionStaff {
            bindings   : input_bindings,
            attributes : vertex_input_attributes,
            state      : input_state,
        }
    }
}

#[derive(Default)]
pub struct VertexBuffer {
    pub memory: vk::DeviceMemory,
    pub buffer: vk::Buffer,
}

#[derive(Default)]
pub struct IndexBuffer {
    pub memory: vk::DeviceMemory,
    pub buffer: vk::Buffer,
    /// The element count of indices used in this index buffer.
    pub count: vkuint,
}

// The uniform data that will be transferred to shader.
//
//	layout(set = 0, binding = 0) uniform UBO {
//		mat4 projectionMatrix;
//		mat4 modelMatrix;
//		mat4 viewMatrix;
//	} ubo;
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct UboVS {
    pub projection: Mat4F,
    pub model: Mat4F,
    pub view: Mat4F,
}

#[derive(Default)]
pub struct DepthImage {
    pub image: vk::Image,
    pub view : vk::ImageView,
    pub memory: vk::DeviceMemory,
}


/// Upload the triangle into device local vertex and index buffers.
pub fn prepare_vertices(device: &VkDevice, command_pool: vk::CommandPool, upload_timeout: VkTimeDuration) -> VkResult<(VertexBuffer, IndexBuffer)> {

    let vertices = allocate_buffer(device, &TRIANGLE_VERTICES, vk::BufferUsageFlags::VERTEX_BUFFER)?;
    let indices = match allocate_buffer(device, &TRIANGLE_INDICES, vk::BufferUsageFlags::INDEX_BUFFER) {
        | Ok(indices) => indices,
        | Err(e) => {
            vertices.discard(device);
            return Err(e)
        },
    };

    if let Err(e) = copy_to_device(device, command_pool, upload_timeout, &vertices, &indices) {
        // a timed out copy may still read the staging buffers.
        if let Err(idle_error) = device.wait_idle() {
            log::error!("Failed to wait for the vertex upload: {}", idle_error);
        }
        vertices.discard(device);
        indices.discard(device);
        return Err(e)
    }

    // Staging buffers must not be deleted before the copies have been executed.
    device.discard(vertices.staging_buffer);
    device.discard(vertices.staging_memory);
    device.discard(indices.staging_buffer);
    device.discard(indices.staging_memory);

    let vertex_buffer = VertexBuffer {
        buffer: vertices.target_buffer,
        memory: vertices.target_memory,
    };

    let index_buffer = IndexBuffer {
        buffer: indices.target_buffer,
        memory: indices.target_memory,
        count: TRIANGLE_INDICES.len() as _,
    };

    Ok((vertex_buffer, index_buffer))
}


fn copy_to_device(device: &VkDevice, command_pool: vk::CommandPool, upload_timeout: VkTimeDuration, vertices: &StagedBuffer, indices: &StagedBuffer) -> VkResult<()> {

    let copy_command = helper::begin_single_command(device, command_pool)?;

    unsafe {

        let vertex_copy_region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: vertices.buffer_size,
        };
        device.logic.handle.cmd_copy_buffer(copy_command, vertices.staging_buffer, vertices.target_buffer, &[vertex_copy_region]);

        let index_copy_region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: indices.buffer_size,
        };
        device.logic.handle.cmd_copy_buffer(copy_command, indices.staging_buffer, indices.target_buffer, &[index_copy_region]);
    }

    // Flushing the command buffer also submits it to the queue and waits on a fence until the copies are done.
    helper::flush_command_buffer(device, command_pool, copy_command, upload_timeout)
}


#[derive(Default)]
struct StagedBuffer {

    buffer_size: vkbytes,

    staging_buffer: vk::Buffer,
    staging_memory: vk::DeviceMemory,

    target_buffer: vk::Buffer,
    target_memory: vk::DeviceMemory,
}

/// Copy `data` into a host visible staging buffer and create a device local buffer of the same size.
fn allocate_buffer<D: Pod>(device: &VkDevice, data: &[D], buffer_usage: vk::BufferUsageFlags) -> VkResult<StagedBuffer> {

    let mut staged = StagedBuffer::default();
    if let Err(e) = staged.allocate(device, bytemuck::cast_slice(data), buffer_usage) {
        staged.discard(device);
        return Err(e)
    }

    Ok(staged)
}

impl StagedBuffer {

    fn allocate(&mut self, device: &VkDevice, bytes: &[u8], buffer_usage: vk::BufferUsageFlags) -> VkResult<()> {

        self.buffer_size = bytes.len() as vkbytes;

        let staging_ci = BufferCI::new(self.buffer_size)
            .usage(vk::BufferUsageFlags::TRANSFER_SRC);
        let (staging_buffer, staging_requirement) = device.build(&staging_ci)?;
        self.staging_buffer = staging_buffer;

        let staging_ai = MemoryAI::from_requirement(device, &staging_requirement, vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT)?;
        self.staging_memory = device.build(&staging_ai)?;
        bind_buffer_memory(device, self.staging_buffer, self.staging_memory, 0)?;

        unsafe {
            let data_ptr = device.logic.handle.map_memory(self.staging_memory, 0, self.buffer_size, vk::MemoryMapFlags::empty())
                .map_err(|e| VkError::api("Map Memory", e))?;
            ptr::copy_nonoverlapping(bytes.as_ptr(), data_ptr as *mut u8, bytes.len());
            device.logic.handle.unmap_memory(self.staging_memory);
        }

        let target_ci = BufferCI::new(self.buffer_size)
            .usage(buffer_usage | vk::BufferUsageFlags::TRANSFER_DST);
        let (target_buffer, target_requirement) = device.build(&target_ci)?;
        self.target_buffer = target_buffer;

        let target_ai = MemoryAI::from_requirement(device, &target_requirement, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        self.target_memory = device.build(&target_ai)?;
        bind_buffer_memory(device, self.target_buffer, self.target_memory, 0)?;

        Ok(())
    }

    fn discard(&self, device: &VkDevice) {

        device.discard(self.staging_buffer);
        device.discard(self.staging_memory);
        device.discard(self.target_buffer);
        device.discard(self.target_memory);
    }
}

impl DepthImage {

    pub fn new(device: &VkDevice, dimension: vk::Extent2D) -> VkResult<DepthImage> {

        let mut depth_image = DepthImage::default();
        if let Err(e) = depth_image.allocate(device, dimension) {
            depth_image.discard(device);
            return Err(e)
        }

        Ok(depth_image)
    }

    fn allocate(&mut self, device: &VkDevice, dimension: vk::Extent2D) -> VkResult<()> {

        let image_ci = vk::ImageCreateInfo {
            s_type: vk::StructureType::IMAGE_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::ImageCreateFlags::empty(),
            image_type   : vk::ImageType::TYPE_2D,
            format       : device.phy.depth_format,
            extent: vk::Extent3D {
                width : dimension.width,
                height: dimension.height,
                depth : 1,
            },
            mip_levels   : 1,
            array_layers : 1,
            samples      : vk::SampleCountFlags::TYPE_1,
            tiling       : vk::ImageTiling::OPTIMAL,
            usage        : vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            sharing_mode : vk::SharingMode::EXCLUSIVE,
            queue_family_index_count: 0,
            p_queue_family_indices  : ptr::null(),
            initial_layout: vk::ImageLayout::UNDEFINED,
        };

        self.image = unsafe {
            device.logic.handle.create_image(&image_ci, None)
                .map_err(|e| VkError::api("Depth Image Creation", e))?
        };
        let image_requirement = unsafe {
            device.logic.handle.get_image_memory_requirements(self.image)
        };

        let memory_ai = MemoryAI::from_requirement(device, &image_requirement, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        self.memory = device.build(&memory_ai)?;

        unsafe {
            device.logic.handle.bind_image_memory(self.image, self.memory, 0)
                .map_err(|e| VkError::api("Binding Image Memory", e))?;
        }

        let depth_view_ci = vk::ImageViewCreateInfo {
            s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::ImageViewCreateFlags::empty(),
            image: self.image,
            view_type: vk::ImageViewType::TYPE_2D,
            format: device.phy.depth_format,
            components: vk::ComponentMapping {
                r: vk::ComponentSwizzle::R,
                g: vk::ComponentSwizzle::G,
                b: vk::ComponentSwizzle::B,
                a: vk::ComponentSwizzle::A,
            },
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: depth_aspect_mask(device.phy.depth_format),
                base_mip_level   : 0,
                level_count      : 1,
                base_array_layer : 0,
                layer_count      : 1,
            },
        };

        self.view = unsafe {
            device.logic.handle.create_image_view(&depth_view_ci, None)
                .map_err(|e| VkError::api("Depth Image View Creation", e))?
        };

        Ok(())
    }

    pub fn discard(&self, device: &VkDevice) {

        device.discard(self.view);
        device.discard(self.image);
        device.discard(self.memory);
    }
}

/// Stencil aspect is only valid for the combined depth stencil formats.
fn depth_aspect_mask(format: vk::Format) -> vk::ImageAspectFlags {

    match format {
        | vk::Format::D32_SFLOAT_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D16_UNORM_S8_UINT => vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
        | _ => vk::ImageAspectFlags::DEPTH,
    }
}
