// SPDX-License-Identifier: MPL-2.0

//! Recording and submitting a single frame.

/// GPU copies of a mesh's vertex pool and triangles.
pub(super) struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub triangle_count: u32,
}

/// One frame's worth of rendering work.
pub(super) struct Job<'a> {
    frame: wgpu::SurfaceTexture,
    frame_view: wgpu::TextureView,
    depth_view: &'a wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    queue: &'a wgpu::Queue,
}

impl<'a> Job<'a> {
    pub(super) fn new(
        frame: wgpu::SurfaceTexture,
        depth_view: &'a wgpu::TextureView,
        device: &wgpu::Device,
        queue: &'a wgpu::Queue,
    ) -> Self {
        Job {
            frame_view: frame.texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("frame view"),
                ..Default::default()
            }),
            frame,
            depth_view,
            encoder: device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            }),
            queue,
        }
    }

    /// Begins a pass that clears the frame to `clear` and the depth buffer to the far plane.
    pub(super) fn add_pass<'this>(&'this mut self, clear: wgpu::Color) -> Pass<'this> {
        Pass(self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.frame_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: true,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    // In clip space, 1.0 is the maximum depth.
                    load: wgpu::LoadOp::Clear(1.0),
                    store: true,
                }),
                stencil_ops: None,
            }),
        }))
    }

    pub(super) fn submit(self) {
        self.queue.submit(Some(self.encoder.finish()));
        self.frame.present();
    }
}

pub(super) struct Pass<'a>(wgpu::RenderPass<'a>);

impl<'a> Pass<'a> {
    pub(super) fn set_pipeline(&mut self, pipeline: &'a wgpu::RenderPipeline) {
        self.0.set_pipeline(pipeline);
    }

    pub(super) fn set_camera(&mut self, bind_group: &'a wgpu::BindGroup) {
        self.0.set_bind_group(0, bind_group, &[]);
    }

    pub(super) fn draw_object(&mut self, bind_group: &'a wgpu::BindGroup, mesh: &'a MeshBuffers) {
        tracing::trace!(triangles = mesh.triangle_count, "drawing object");

        self.0.set_bind_group(1, bind_group, &[]);
        self.0.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.0
            .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.0.draw_indexed(0..3 * mesh.triangle_count, 0, 0..1);
    }
}
