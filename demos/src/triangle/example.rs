
use ash::vk;
use winit::keyboard::KeyCode;

use vkbase::context::{VkDevice, VkSwapchain, VulkanContext};
use vkbase::ci::VkObjectBuildableCI;
use vkbase::ci::command::CommandPoolCI;
use vkbase::ci::shader::ShaderModuleCI;
use vkbase::frame::{FrameRecorder, FrameInfo, FramePool, UniformRegion};
use vkbase::camera::Camera;
use vkbase::utils::time::VkTimeDuration;
use vkbase::{EventController, FrameAction};
use vkbase::{VkResult, VkError};
use vkbase::{Vec3F, Mat4F};

use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::ptr;

use crate::data::{Vertex, VertexBuffer, IndexBuffer, UboVS, DepthImage};

const SHADER_VERTEX_FILE  : &str = "triangle.vert.spv";
const SHADER_FRAGMENT_FILE: &str = "triangle.frag.spv";

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.2, 1.0];

pub struct VulkanExample {

    // the resource about vertex buffer.
    vertex_buffer: VertexBuffer,
    // the resource about index buffer.
    index_buffer: IndexBuffer,

    depth_image: DepthImage,

    render_pass: vk::RenderPass,

    /// The pipeline layout is used by a pipeline to access the descriptor sets.
    ///
    /// It defines interface (without binding any actual data) between the shader stages used by the pipeline and the shader resources.
    pipeline_layout: vk::PipelineLayout,

    /// Pipelines (often called "pipeline state objects") are used to bake all states that affect a pipeline.
    ///
    /// Viewport and scissor are dynamic states here, so the pipeline survives a swapchain rebuild.
    pipeline: vk::Pipeline,

    /// one framebuffer for each swapchain image.
    framebuffers: Vec<vk::Framebuffer>,

    descriptor_set_layout: vk::DescriptorSetLayout,
    descriptor_pool: vk::DescriptorPool,
    /// one descriptor set for each frame slot, pointing at the uniform region of that slot.
    descriptor_sets: Vec<vk::DescriptorSet>,

    camera: Camera,
    model: Mat4F,
}

impl vkbase::Workflow for VulkanExample {

    fn prepare(&mut self, device: &VkDevice, frames: &FramePool<VkDevice>) -> VkResult<()> {

        let (descriptor_pool, descriptor_sets) = setup_descriptor_sets(device, self.descriptor_set_layout, frames)?;
        self.descriptor_pool = descriptor_pool;
        self.descriptor_sets = descriptor_sets;

        Ok(())
    }

    fn swapchain_reload(&mut self, device: &VkDevice, swapchain: &VkSwapchain) -> VkResult<()> {

        // The swapchain images are new, so the framebuffers and the depth attachment have to follow.
        let depth_image = DepthImage::new(device, swapchain.dimension)?;
        let framebuffers = match setup_framebuffers(device, swapchain, self.render_pass, &depth_image) {
            | Ok(framebuffers) => framebuffers,
            | Err(e) => {
                depth_image.discard(device);
                return Err(e)
            },
        };

        device.discard(&self.framebuffers);
        self.depth_image.discard(device);

        self.depth_image = depth_image;
        self.framebuffers = framebuffers;

        self.camera.update_aspect_ratio(aspect_ratio(swapchain.dimension));

        Ok(())
    }

    fn receive_input(&mut self, inputer: &EventController, _delta_time: f32) -> FrameAction {

        if inputer.key.is_key_pressed(KeyCode::Escape) {
            return FrameAction::Terminal
        }

        FrameAction::Rendering
    }

    fn deinit(&mut self, device: &VkDevice) -> VkResult<()> {

        self.discard(device);
        Ok(())
    }
}

impl FrameRecorder<VkDevice> for VulkanExample {

    fn update_uniforms(&mut self, _frame: &FrameInfo, uniforms: &mut UniformRegion) -> VkResult<()> {

        let ubo_data = UboVS {
            projection: self.camera.perspective_matrix(),
            model: self.model,
            view: self.camera.view_matrix(),
        };
        uniforms.write(&ubo_data)
    }

    fn record_commands(&mut self, device: &VkDevice, frame: &FrameInfo, command: vk::CommandBuffer) -> VkResult<()> {

        let framebuffer = self.framebuffers.get(frame.image_index as usize).cloned()
            .ok_or_else(|| VkError::other(format!("No framebuffer for swapchain image {}.", frame.image_index)))?;
        let descriptor_set = self.descriptor_sets.get(frame.frame_index).cloned()
            .ok_or_else(|| VkError::other(format!("No descriptor set for frame slot {}.", frame.frame_index)))?;

        let clear_values = [
            vk::ClearValue { color: vk::ClearColorValue { float32: CLEAR_COLOR } },
            vk::ClearValue { depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 } },
        ];

        let renderpass_begin_ci = vk::RenderPassBeginInfo {
            s_type: vk::StructureType::RENDER_PASS_BEGIN_INFO,
            p_next: ptr::null(),
            render_pass: self.render_pass,
            framebuffer,
            render_area: vk::Rect2D {
                extent: frame.dimension,
                offset: vk::Offset2D { x: 0, y: 0 },
            },
            clear_value_count: clear_values.len() as _,
            p_clear_values   : clear_values.as_ptr(),
        };

        let viewport = vk::Viewport {
            x: 0.0, y: 0.0,
            width: frame.dimension.width as f32, height: frame.dimension.height as f32,
            min_depth: 0.0, max_depth: 1.0,
        };

        let scissor = vk::Rect2D {
            extent: frame.dimension,
            offset: vk::Offset2D { x: 0, y: 0 },
        };

        let recorder = &device.logic.handle;
        unsafe {
            recorder.cmd_begin_render_pass(command, &renderpass_begin_ci, vk::SubpassContents::INLINE);
            recorder.cmd_set_viewport(command, 0, &[viewport]);
            recorder.cmd_set_scissor(command, 0, &[scissor]);
            recorder.cmd_bind_descriptor_sets(command, vk::PipelineBindPoint::GRAPHICS, self.pipeline_layout, 0, &[descriptor_set], &[]);
            recorder.cmd_bind_pipeline(command, vk::PipelineBindPoint::GRAPHICS, self.pipeline);

            recorder.cmd_bind_vertex_buffers(command, 0, &[self.vertex_buffer.buffer], &[0]);
            recorder.cmd_bind_index_buffer(command, self.index_buffer.buffer, 0, vk::IndexType::UINT32);

            recorder.cmd_draw_indexed(command, self.index_buffer.count, 1, 0, 0, 0);

            recorder.cmd_end_render_pass(command);
        }

        Ok(())
    }
}

impl VulkanExample {

    pub fn new(context: &VulkanContext, shader_dir: &Path, upload_timeout: VkTimeDuration) -> VkResult<VulkanExample> {

        let device = &context.device;
        let swapchain = &context.swapchain;
        let dimension = swapchain.dimension;

        // the command pool is only used for the one-off vertex upload.
        let upload_pool_ci = CommandPoolCI::new(device.logic.graphics_queue.family_index)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);
        let upload_pool = device.build(&upload_pool_ci)?;
        let vertices = crate::data::prepare_vertices(device, upload_pool, upload_timeout);
        device.discard(upload_pool);
        let (vertex_buffer, index_buffer) = vertices?;

        let mut camera = Camera::default();
        camera.set_position(Vec3F::new(0.0, 0.0, -2.5));
        camera.set_perspective(60.0, aspect_ratio(dimension), 1.0, 256.0);

        let mut target = VulkanExample::unbuilt(vertex_buffer, index_buffer, camera);

        // everything created before a failure is released, null handles are skipped by the driver.
        if let Err(e) = target.setup_objects(device, swapchain, shader_dir) {
            target.discard(device);
            return Err(e)
        }

        Ok(target)
    }

    /// An example owning only its vertex data, every other object is still a null handle.
    fn unbuilt(vertex_buffer: VertexBuffer, index_buffer: IndexBuffer, camera: Camera) -> VulkanExample {

        VulkanExample {
            vertex_buffer, index_buffer, camera,
            depth_image: DepthImage::default(),
            render_pass: vk::RenderPass::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
            framebuffers: Vec::new(),
            descriptor_set_layout: vk::DescriptorSetLayout::null(),
            descriptor_pool: vk::DescriptorPool::null(),
            descriptor_sets: Vec::new(),
            model: Mat4F::identity(),
        }
    }

    fn setup_objects(&mut self, device: &VkDevice, swapchain: &VkSwapchain, shader_dir: &Path) -> VkResult<()> {

        let (descriptor_set_layout, pipeline_layout) = setup_descriptor_layout(device)?;
        self.descriptor_set_layout = descriptor_set_layout;
        self.pipeline_layout = pipeline_layout;

        self.render_pass = setup_renderpass(device, swapchain)?;
        self.depth_image = DepthImage::new(device, swapchain.dimension)?;
        self.framebuffers = setup_framebuffers(device, swapchain, self.render_pass, &self.depth_image)?;
        self.pipeline = prepare_pipelines(device, self.render_pass, self.pipeline_layout, shader_dir)?;

        Ok(())
    }

    fn discard(&self, device: &VkDevice) {

        device.discard(self.pipeline);
        device.discard(self.pipeline_layout);
        device.discard(self.descriptor_set_layout);
        // descriptor sets are freed together with their pool.
        device.discard(self.descriptor_pool);
        device.discard(self.render_pass);

        device.discard(&self.framebuffers);
        self.depth_image.discard(device);

        device.discard(self.vertex_buffer.buffer);
        device.discard(self.vertex_buffer.memory);

        device.discard(self.index_buffer.buffer);
        device.discard(self.index_buffer.memory);
    }
}

fn aspect_ratio(dimension: vk::Extent2D) -> f32 {
    dimension.width as f32 / dimension.height.max(1) as f32
}

fn setup_descriptor_layout(device: &VkDevice) -> VkResult<(vk::DescriptorSetLayout, vk::PipelineLayout)> {

    // Binding 0: Uniform buffer (Vertex shader).
    let layout_bindings = [
        vk::DescriptorSetLayoutBinding {
            binding: 0,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: 1,
            stage_flags: vk::ShaderStageFlags::VERTEX,
            p_immutable_samplers: ptr::null(),
        },
    ];

    let descriptor_layout_ci = vk::DescriptorSetLayoutCreateInfo {
        s_type: vk::StructureType::DESCRIPTOR_SET_LAYOUT_CREATE_INFO,
        p_next: ptr::null(),
        flags: vk::DescriptorSetLayoutCreateFlags::empty(),
        binding_count: layout_bindings.len() as _,
        p_bindings   : layout_bindings.as_ptr(),
    };

    let descriptor_set_layout = unsafe {
        device.logic.handle.create_descriptor_set_layout(&descriptor_layout_ci, None)
            .map_err(|e| VkError::api("Descriptor Set Layout Creation", e))?
    };

    let pipeline_layout_ci = vk::PipelineLayoutCreateInfo {
        s_type: vk::StructureType::PIPELINE_LAYOUT_CREATE_INFO,
        p_next: ptr::null(),
        flags: vk::PipelineLayoutCreateFlags::empty(),
        set_layout_count: 1,
        p_set_layouts   : &descriptor_set_layout,
        push_constant_range_count: 0,
        p_push_constant_ranges   : ptr::null(),
    };

    let pipeline_layout = unsafe {
        device.logic.handle.create_pipeline_layout(&pipeline_layout_ci, None)
    };
    let pipeline_layout = match pipeline_layout {
        | Ok(layout) => layout,
        | Err(e) => {
            device.discard(descriptor_set_layout);
            return Err(VkError::api("Pipeline Layout Creation", e))
        },
    };

    Ok((descriptor_set_layout, pipeline_layout))
}

/// Allocate one descriptor set per frame slot, each bound to the uniform region of its slot.
fn setup_descriptor_sets(device: &VkDevice, layout: vk::DescriptorSetLayout, frames: &FramePool<VkDevice>) -> VkResult<(vk::DescriptorPool, Vec<vk::DescriptorSet>)> {

    let set_count = frames.len() as u32;

    let pool_sizes = [
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: set_count,
        },
    ];

    let descriptor_pool_ci = vk::DescriptorPoolCreateInfo {
        s_type: vk::StructureType::DESCRIPTOR_POOL_CREATE_INFO,
        p_next: ptr::null(),
        flags: vk::DescriptorPoolCreateFlags::empty(),
        max_sets: set_count,
        pool_size_count: pool_sizes.len() as _,
        p_pool_sizes: pool_sizes.as_ptr(),
    };

    let descriptor_pool = unsafe {
        device.logic.handle.create_descriptor_pool(&descriptor_pool_ci, None)
            .map_err(|e| VkError::api("Descriptor Pool Creation", e))?
    };

    let set_layouts = vec![layout; frames.len()];

    let descriptor_set_allot_ci = vk::DescriptorSetAllocateInfo {
        s_type: vk::StructureType::DESCRIPTOR_SET_ALLOCATE_INFO,
        p_next: ptr::null(),
        descriptor_pool,
        descriptor_set_count: set_layouts.len() as _,
        p_set_layouts       : set_layouts.as_ptr(),
    };

    let descriptor_sets = unsafe {
        device.logic.handle.allocate_descriptor_sets(&descriptor_set_allot_ci)
    };
    let descriptor_sets = match descriptor_sets {
        | Ok(sets) => sets,
        | Err(e) => {
            device.discard(descriptor_pool);
            return Err(VkError::api("Allocate Descriptor Sets", e))
        },
    };

    let buffer_infos: Vec<vk::DescriptorBufferInfo> = frames.iter()
        .map(|slot| slot.uniforms.descriptor())
        .collect();

    let write_infos: Vec<vk::WriteDescriptorSet> = descriptor_sets.iter().zip(buffer_infos.iter())
        .map(|(&dst_set, buffer_info)| {
            vk::WriteDescriptorSet {
                s_type: vk::StructureType::WRITE_DESCRIPTOR_SET,
                p_next: ptr::null(),
                dst_set,
                dst_binding: 0,
                dst_array_element: 0,
                descriptor_count: 1,
                descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
                p_image_info: ptr::null(),
                p_buffer_info: buffer_info,
                p_texel_buffer_view: ptr::null(),
            }
        }).collect();

    unsafe {
        device.logic.handle.update_descriptor_sets(&write_infos, &[]);
    }

    log::debug!("Bound {} uniform descriptor sets.", descriptor_sets.len());

    Ok((descriptor_pool, descriptor_sets))
}

fn setup_renderpass(device: &VkDevice, swapchain: &VkSwapchain) -> VkResult<vk::RenderPass> {

    // Descriptors for the attachments used by this renderpass.
    let attachments = [
        // Color attachment.
        vk::AttachmentDescription {
            flags: vk::AttachmentDescriptionFlags::empty(),
            format: swapchain.format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        },
        // Depth attachment.
        vk::AttachmentDescription {
            flags: vk::AttachmentDescriptionFlags::empty(),
            format: device.phy.depth_format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::DONT_CARE,
            stencil_load_op  : vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op : vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        },
    ];

    let color_refs = [
        vk::AttachmentReference {
            attachment: 0, // Attachment 0 is color.
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }
    ];
    let depth_ref = vk::AttachmentReference {
        attachment: 1, // Attachment 1 is depth-stencil.
        layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    };

    let subpass_descriptions = [
        vk::SubpassDescription {
            flags                      : vk::SubpassDescriptionFlags::empty(),
            pipeline_bind_point        : vk::PipelineBindPoint::GRAPHICS,
            input_attachment_count     : 0,
            p_input_attachments        : ptr::null(),
            color_attachment_count     : color_refs.len() as _,
            p_color_attachments        : color_refs.as_ptr(),
            p_resolve_attachments      : ptr::null(),
            p_depth_stencil_attachment : &depth_ref,
            preserve_attachment_count  : 0,
            p_preserve_attachments     : ptr::null(),
        }
    ];

    // Subpass dependencies for layout transitions.
    let dependencies = [
        // The depth attachment is cleared by every frame, so earlier depth writes must finish first.
        vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask   : vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            dst_stage_mask   : vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            src_access_mask  : vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            dst_access_mask  : vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            dependency_flags : vk::DependencyFlags::empty(),
        },
        // The color layout transition waits for the image acquired semaphore at the color output stage.
        vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask   : vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage_mask   : vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            src_access_mask  : vk::AccessFlags::empty(),
            dst_access_mask  : vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::COLOR_ATTACHMENT_READ,
            dependency_flags : vk::DependencyFlags::empty(),
        },
    ];

    let renderpass_ci = vk::RenderPassCreateInfo {
        s_type: vk::StructureType::RENDER_PASS_CREATE_INFO,
        p_next: ptr::null(),
        flags: vk::RenderPassCreateFlags::empty(),
        attachment_count: attachments.len() as _,
        p_attachments   : attachments.as_ptr(),
        subpass_count   : subpass_descriptions.len() as _,
        p_subpasses     : subpass_descriptions.as_ptr(),
        dependency_count: dependencies.len() as _,
        p_dependencies  : dependencies.as_ptr(),
    };

    let render_pass = unsafe {
        device.logic.handle.create_render_pass(&renderpass_ci, None)
            .map_err(|e| VkError::api("Render Pass Creation", e))?
    };
    Ok(render_pass)
}

fn setup_framebuffers(device: &VkDevice, swapchain: &VkSwapchain, render_pass: vk::RenderPass, depth_image: &DepthImage) -> VkResult<Vec<vk::Framebuffer>> {

    let mut framebuffers = Vec::with_capacity(swapchain.image_count());
    let dimension = swapchain.dimension;

    for swapchain_image in swapchain.images() {

        let attachments = [
            swapchain_image.view, // color attachment is the view of the swapchain image.
            depth_image.view, // depth/stencil attachment is the same for all frame buffers.
        ];

        let framebuffer_ci = vk::FramebufferCreateInfo {
            s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::FramebufferCreateFlags::empty(),
            attachment_count: attachments.len() as _,
            p_attachments   : attachments.as_ptr(),
            width : dimension.width,
            height: dimension.height,
            layers: 1,
            render_pass,
        };

        let framebuffer = unsafe {
            device.logic.handle.create_framebuffer(&framebuffer_ci, None)
        };

        match framebuffer {
            | Ok(framebuffer) => framebuffers.push(framebuffer),
            | Err(e) => {
                device.discard(&framebuffers);
                return Err(VkError::api("Framebuffer Creation", e))
            },
        }
    }

    Ok(framebuffers)
}

fn prepare_pipelines(device: &VkDevice, render_pass: vk::RenderPass, layout: vk::PipelineLayout, shader_dir: &Path) -> VkResult<vk::Pipeline> {

    // Input assembly state describes how primitives are assembled.
    // This pipeline will assemble vertex data as a triangle lists (though we only use one triangle).
    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_INPUT_ASSEMBLY_STATE_CREATE_INFO,
        p_next: ptr::null(),
        flags : vk::PipelineInputAssemblyStateCreateFlags::empty(),
        topology: vk::PrimitiveTopology::TRIANGLE_LIST,
        primitive_restart_enable: vk::FALSE,
    };

    let rasterization_state = vk::PipelineRasterizationStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_RASTERIZATION_STATE_CREATE_INFO,
        p_next: ptr::null(),
        flags : vk::PipelineRasterizationStateCreateFlags::empty(),
        depth_clamp_enable         : vk::FALSE,
        rasterizer_discard_enable  : vk::FALSE,
        polygon_mode               : vk::PolygonMode::FILL,
        cull_mode                  : vk::CullModeFlags::NONE,
        front_face                 : vk::FrontFace::COUNTER_CLOCKWISE,
        depth_bias_enable          : vk::FALSE,
        depth_bias_constant_factor : 0.0,
        depth_bias_clamp           : 0.0,
        depth_bias_slope_factor    : 0.0,
        line_width                 : 1.0,
    };

    // Blending is not used in this example.
    let blend_attachments = [
        vk::PipelineColorBlendAttachmentState {
            blend_enable: vk::FALSE,
            src_color_blend_factor: vk::BlendFactor::ONE,
            dst_color_blend_factor: vk::BlendFactor::ZERO,
            color_blend_op: vk::BlendOp::ADD,
            src_alpha_blend_factor: vk::BlendFactor::ONE,
            dst_alpha_blend_factor: vk::BlendFactor::ZERO,
            alpha_blend_op: vk::BlendOp::ADD,
            color_write_mask: vk::ColorComponentFlags::RGBA,
        },
    ];
    let blend_state = vk::PipelineColorBlendStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_COLOR_BLEND_STATE_CREATE_INFO,
        p_next: ptr::null(),
        flags : vk::PipelineColorBlendStateCreateFlags::empty(),
        logic_op_enable: vk::FALSE,
        logic_op       : vk::LogicOp::COPY,
        attachment_count: blend_attachments.len() as _,
        p_attachments   : blend_attachments.as_ptr(),
        blend_constants : [0.0; 4]
    };

    // The actual viewport and scissor are set in the command buffer, only their counts are fixed here.
    let viewport_state = vk::PipelineViewportStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_VIEWPORT_STATE_CREATE_INFO,
        p_next: ptr::null(),
        flags : vk::PipelineViewportStateCreateFlags::empty(),
        viewport_count : 1,
        p_viewports    : ptr::null(),
        scissor_count  : 1,
        p_scissors     : ptr::null(),
    };

    let stencil_keep = vk::StencilOpState {
        fail_op: vk::StencilOp::KEEP,
        pass_op: vk::StencilOp::KEEP,
        depth_fail_op: vk::StencilOp::KEEP,
        compare_op   : vk::CompareOp::ALWAYS,
        compare_mask : 0,
        write_mask   : 0,
        reference    : 0,
    };

    // Depth test and write are enabled, stencil is unused.
    let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_DEPTH_STENCIL_STATE_CREATE_INFO,
        p_next: ptr::null(),
        flags : vk::PipelineDepthStencilStateCreateFlags::empty(),
        depth_test_enable        : vk::TRUE,
        depth_write_enable       : vk::TRUE,
        depth_compare_op         : vk::CompareOp::LESS_OR_EQUAL,
        depth_bounds_test_enable : vk::FALSE,
        stencil_test_enable      : vk::FALSE,
        front: stencil_keep,
        back : stencil_keep,
        min_depth_bounds: 0.0,
        max_depth_bounds: 1.0,
    };

    // Multi sampling is not used in this example.
    let multisample_state = vk::PipelineMultisampleStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_MULTISAMPLE_STATE_CREATE_INFO,
        p_next: ptr::null(),
        flags : vk::PipelineMultisampleStateCreateFlags::empty(),
        rasterization_samples: vk::SampleCountFlags::TYPE_1,
        sample_shading_enable: vk::FALSE,
        min_sample_shading: 0.0,
        p_sample_mask: ptr::null(),
        alpha_to_coverage_enable: vk::FALSE,
        alpha_to_one_enable     : vk::FALSE,
    };

    let dynamics = [
        vk::DynamicState::VIEWPORT,
        vk::DynamicState::SCISSOR,
    ];
    let dynamic_state = vk::PipelineDynamicStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_DYNAMIC_STATE_CREATE_INFO,
        p_next: ptr::null(),
        flags : vk::PipelineDynamicStateCreateFlags::empty(),
        dynamic_state_count: dynamics.len() as _,
        p_dynamic_states   : dynamics.as_ptr(),
    };

    let input_descriptions = Vertex::input_description();

    let vert_path = spirv_path(shader_dir, SHADER_VERTEX_FILE)?;
    let frag_path = spirv_path(shader_dir, SHADER_FRAGMENT_FILE)?;

    let vert_module = ShaderModuleCI::from_spirv(vert_path)
        .build(device)?;
    let frag_module = match ShaderModuleCI::from_spirv(frag_path).build(device) {
        | Ok(module) => module,
        | Err(e) => {
            device.discard(vert_module);
            return Err(e)
        },
    };

    let main_name = entry_point_name();

    let shader_states = [
        vk::PipelineShaderStageCreateInfo {
            s_type : vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
            p_next : ptr::null(),
            flags  : vk::PipelineShaderStageCreateFlags::empty(),
            stage  : vk::ShaderStageFlags::VERTEX,
            module : vert_module,
            p_name : main_name.as_ptr(), // Main entry point for the shader
            p_specialization_info: ptr::null(),
        },
        vk::PipelineShaderStageCreateInfo {
            s_type : vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
            p_next : ptr::null(),
            flags  : vk::PipelineShaderStageCreateFlags::empty(),
            stage  : vk::ShaderStageFlags::FRAGMENT,
            module : frag_module,
            p_name : main_name.as_ptr(),
            p_specialization_info: ptr::null(),
        },
    ];

    let pipeline_ci = vk::GraphicsPipelineCreateInfo {
        s_type: vk::StructureType::GRAPHICS_PIPELINE_CREATE_INFO,
        p_next: ptr::null(),
        flags: vk::PipelineCreateFlags::empty(),
        stage_count            : shader_states.len() as _,
        p_stages               : shader_states.as_ptr(),
        p_vertex_input_state   : &input_descriptions.state,
        p_input_assembly_state : &input_assembly_state,
        p_tessellation_state   : ptr::null(),
        p_viewport_state       : &viewport_state,
        p_rasterization_state  : &rasterization_state,
        p_multisample_state    : &multisample_state,
        p_depth_stencil_state  : &depth_stencil_state,
        p_color_blend_state    : &blend_state,
        p_dynamic_state        : &dynamic_state,
        subpass: 0,
        base_pipeline_handle: vk::Pipeline::null(),
        base_pipeline_index: -1,
        layout, render_pass,
    };

    let pipelines = unsafe {
        device.logic.handle.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_ci], None)
    };

    // Shader modules are no longer needed once the graphics pipeline has been created.
    device.discard(vert_module);
    device.discard(frag_module);

    let pipeline = pipelines
        .map_err(|(_, e)| VkError::api("Graphics Pipeline Creation", e))?
        .pop()
        .ok_or_else(|| VkError::other("No graphics pipeline was created."))?;
    Ok(pipeline)
}

/// Locate a compiled shader, pointing at the compile step when it is missing.
fn spirv_path(shader_dir: &Path, file_name: &str) -> VkResult<PathBuf> {

    let path = shader_dir.join(file_name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(VkError::other(format!(
            "Missing SPIR-V shader {:?}, compile the GLSL sources with glslc (see demos/shaders/README.md) or pass --shader-dir.",
            path)))
    }
}

fn entry_point_name() -> &'static CStr {
    // SAFETY: the literal ends with exactly one nul byte.
    unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn aspect_ratio_survives_zero_height() {

        assert_eq!(aspect_ratio(vk::Extent2D { width: 1280, height: 720 }), 1280.0 / 720.0);
        assert_eq!(aspect_ratio(vk::Extent2D { width: 800, height: 0 }), 800.0);
    }

    #[test]
    fn unbuilt_example_owns_no_pipeline_objects() {

        let example = VulkanExample::unbuilt(VertexBuffer::default(), IndexBuffer::default(), Camera::default());

        assert_eq!(example.render_pass, vk::RenderPass::null());
        assert_eq!(example.pipeline_layout, vk::PipelineLayout::null());
        assert_eq!(example.pipeline, vk::Pipeline::null());
        assert_eq!(example.descriptor_set_layout, vk::DescriptorSetLayout::null());
        assert_eq!(example.descriptor_pool, vk::DescriptorPool::null());
        assert_eq!(example.depth_image.image, vk::Image::null());
        assert!(example.framebuffers.is_empty());
        assert!(example.descriptor_sets.is_empty());
    }

    #[test]
    fn missing_shader_names_the_compile_step() {

        let shader_dir = Path::new("no/such/shader/dir");
        let error = match spirv_path(shader_dir, SHADER_VERTEX_FILE) {
            | Ok(path) => panic!("{:?} should not exist", path),
            | Err(e) => e.to_string(),
        };

        assert!(error.contains("triangle.vert.spv"));
        assert!(error.contains("glslc"));
    }

    #[test]
    fn shader_sources_ship_with_the_demo() {

        let shader_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders").join("triangle");

        assert!(shader_dir.join("triangle.vert").is_file());
        assert!(shader_dir.join("triangle.frag").is_file());
    }

    #[test]
    fn shader_entry_point_is_main() {
        assert_eq!(entry_point_name().to_str(), Ok("main"));
    }
}
