// SPDX-License-Identifier: MPL-2.0

//! The wgpu renderer.
//!
//! Every frame is drawn in a single depth-tested pass. Bind group 0 holds the camera (and fog);
//! bind group 1 holds the world matrix and material of the object being drawn.

mod render;

use std::{collections::HashMap, rc::Rc};

use raw_window_handle::HasRawWindowHandle;
use wgpu::{util::DeviceExt as _, *};

use crate::{linear::Mat4, Mesh, MeshVertex, Object, Scene};
use render::{Job, MeshBuffers};

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no compatible graphics adapter was found")]
    NoCompatibleAdapterFound,
    #[error("no compatible graphics device was found")]
    NoCompatibleDeviceFound,
    #[error("the surface supports no texture formats")]
    NoSupportedSurfaceFormat,
    #[error("failed to acquire the next frame: {0}")]
    Surface(#[from] SurfaceError),
}

/// Draws [scenes](Scene) onto a window surface.
#[derive(Debug)]
pub struct Renderer {
    camera_layout: BindGroupLayout,
    object_layout: BindGroupLayout,
    device: Device,
    queue: Queue,
    surface: Surface,
    surface_format: TextureFormat,
    depth_view: TextureView,
    opaque_pipeline: RenderPipeline,
    /// Blends without writing depth, so translucent objects never hide one another.
    translucent_pipeline: RenderPipeline,
    width: u32,
    height: u32,
}

impl Renderer {
    /// Creates a new `Renderer`.
    ///
    /// # Safety
    ///
    /// `window` must live for as long as the returned renderer.
    pub async unsafe fn new(
        window: &impl HasRawWindowHandle,
        backends: Backends,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Self, Error> {
        let (adapter, surface) = Self::create_adapter_and_surface(window, backends).await?;
        let surface_format = Self::choose_surface_format(&surface.get_supported_formats(&adapter))?;
        tracing::info!(
            adapter = %adapter.get_info().name,
            backend = ?adapter.get_info().backend,
            format = ?surface_format,
            "created surface"
        );

        let (device, queue) = Self::create_device_and_queue(&adapter).await?;
        let camera_layout = Self::create_uniform_layout(&device, "camera uniform layout");
        let object_layout = Self::create_uniform_layout(&device, "object uniform layout");
        let opaque_pipeline =
            Self::create_pipeline(&device, surface_format, &camera_layout, &object_layout, true);
        let translucent_pipeline =
            Self::create_pipeline(&device, surface_format, &camera_layout, &object_layout, false);
        let depth_view = Self::create_depth_view(&device, surface_width, surface_height);

        let mut this = Self {
            camera_layout,
            object_layout,
            device,
            queue,
            surface,
            surface_format,
            depth_view,
            opaque_pipeline,
            translucent_pipeline,
            width: surface_width,
            height: surface_height,
        };
        this.resize_surface(surface_width, surface_height);

        Ok(this)
    }

    /// Creates handles to the graphics backend as well as the surface upon which rendering will
    /// take place.
    async fn create_adapter_and_surface(
        window: &impl HasRawWindowHandle,
        backends: Backends,
    ) -> Result<(Adapter, Surface), Error> {
        let instance = Instance::new(backends);

        // SAFETY: the caller guarantees that the window is valid and outlives the renderer, which
        // owns the surface.
        let surface = unsafe { instance.create_surface(window) };

        instance
            .request_adapter(&RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .ok_or(Error::NoCompatibleAdapterFound)
            .map(|adapter| (adapter, surface))
    }

    /// Prefers an sRGB format so that colors are blended in linear space.
    fn choose_surface_format(formats: &[TextureFormat]) -> Result<TextureFormat, Error> {
        formats
            .iter()
            .copied()
            .find(|format| format.describe().srgb)
            .or_else(|| formats.first().copied())
            .ok_or(Error::NoSupportedSurfaceFormat)
    }

    /// Creates handles to the logical graphics device as well as the command buffer queue.
    async fn create_device_and_queue(adapter: &Adapter) -> Result<(Device, Queue), Error> {
        adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("tunnel-ride device"),
                    limits: adapter.limits(),
                    features: Features::empty(),
                },
                None,
            )
            .await
            .map_err(|_| Error::NoCompatibleDeviceFound)
    }

    fn create_uniform_layout(device: &Device, label: &str) -> BindGroupLayout {
        device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }

    fn create_depth_view(device: &Device, width: u32, height: u32) -> TextureView {
        device
            .create_texture(&TextureDescriptor {
                label: Some("depth texture"),
                size: Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: TextureUsages::RENDER_ATTACHMENT,
            })
            .create_view(&TextureViewDescriptor::default())
    }

    fn create_pipeline(
        device: &Device,
        surface_format: TextureFormat,
        camera_layout: &BindGroupLayout,
        object_layout: &BindGroupLayout,
        depth_write_enabled: bool,
    ) -> RenderPipeline {
        let shader = device.create_shader_module(include_wgsl!("renderer/shaders/scene.wgsl"));

        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(if depth_write_enabled {
                "opaque pipeline"
            } else {
                "translucent pipeline"
            }),
            layout: Some(&device.create_pipeline_layout(&PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &[camera_layout, object_layout],
                push_constant_ranges: &[],
            })),
            vertex: VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as BufferAddress,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                }],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                front_face: FrontFace::Ccw,
                // Open meshes such as fairing halves are seen from both sides.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
        })
    }

    /// Reconfigures the surface and depth buffer for a new window size.
    ///
    /// Zero-sized surfaces (as when a window is minimized) are ignored.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "ignoring resize to an empty surface");
            return;
        }

        self.width = width;
        self.height = height;
        self.surface.configure(
            &self.device,
            &SurfaceConfiguration {
                usage: TextureUsages::RENDER_ATTACHMENT,
                format: self.surface_format,
                width,
                height,
                present_mode: PresentMode::Fifo,
            },
        );
        self.depth_view = Self::create_depth_view(&self.device, width, height);
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Draws `scene` and presents it.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render(&mut self, scene: &Scene) -> Result<(), Error> {
        tracing::trace!(objects = scene.objects.len(), "rendering scene");

        let camera = self.create_camera_bind_group(scene);
        let mut meshes: HashMap<*const Mesh, MeshBuffers> = HashMap::new();
        let (opaque, translucent) = scene.draw_order();
        let mut prepare = |indices: Vec<usize>| -> Vec<_> {
            indices
                .into_iter()
                .map(|i| &scene.objects[i])
                .filter(|object| !object.mesh.triangles.is_empty())
                .map(|object| {
                    meshes
                        .entry(Rc::as_ptr(&object.mesh))
                        .or_insert_with(|| self.create_mesh_buffers(&object.mesh));
                    (Rc::as_ptr(&object.mesh), self.create_object_bind_group(object))
                })
                .collect()
        };
        let opaque = prepare(opaque);
        let translucent = prepare(translucent);

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                tracing::debug!("surface lost; reconfiguring");
                self.resize_surface(self.width, self.height);
                return Ok(());
            }
            Err(SurfaceError::Timeout) => {
                tracing::debug!("timed out acquiring a frame; skipping it");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        let mut job = Job::new(frame, &self.depth_view, &self.device, &self.queue);
        {
            let background = scene.background;
            let mut pass = job.add_pass(Color {
                r: background.x as f64,
                g: background.y as f64,
                b: background.z as f64,
                a: 1.,
            });
            pass.set_camera(&camera);
            for (pipeline, objects) in [
                (&self.opaque_pipeline, &opaque),
                (&self.translucent_pipeline, &translucent),
            ] {
                pass.set_pipeline(pipeline);
                for (mesh, bind_group) in objects {
                    if let Some(buffers) = meshes.get(mesh) {
                        pass.draw_object(bind_group, buffers);
                    }
                }
            }
        }
        job.submit();

        Ok(())
    }

    fn create_camera_bind_group(&self, scene: &Scene) -> BindGroup {
        let (fog_near, fog_far, fog_enabled) = match scene.fog {
            Some((near, far)) => (near, far, 1.),
            None => (0., 0., 0.),
        };
        let uniform = CameraUniform {
            view_projection: scene
                .camera
                .view_projection_matrix(self.aspect_ratio())
                .to_cols_array_2d(),
            eye: scene.camera.position.extend(1.).to_array(),
            fog_color: scene.background.extend(1.).to_array(),
            fog: [fog_near, fog_far, fog_enabled, 0.],
        };

        self.create_uniform_bind_group(&self.camera_layout, bytemuck::bytes_of(&uniform))
    }

    fn create_object_bind_group(&self, object: &Object) -> BindGroup {
        let world = object.node.global_transformation_matrix();
        let material = &object.material;
        let uniform = ObjectUniform {
            world: world.to_cols_array_2d(),
            normal_matrix: normal_matrix(world).to_cols_array_2d(),
            color: material.color().extend(material.opacity()).to_array(),
            emissive: [material.emissive(), 0., 0., 0.],
        };

        self.create_uniform_bind_group(&self.object_layout, bytemuck::bytes_of(&uniform))
    }

    fn create_uniform_bind_group(&self, layout: &BindGroupLayout, contents: &[u8]) -> BindGroup {
        self.device.create_bind_group(&BindGroupDescriptor {
            label: None,
            layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::Buffer(
                    self.device
                        .create_buffer_init(&util::BufferInitDescriptor {
                            label: None,
                            contents,
                            usage: BufferUsages::UNIFORM,
                        })
                        .as_entire_buffer_binding(),
                ),
            }],
        })
    }

    fn create_mesh_buffers(&self, mesh: &Mesh) -> MeshBuffers {
        MeshBuffers {
            vertex_buffer: self.create_buffer(&mesh.vertex_pool, BufferUsages::VERTEX),
            index_buffer: self.create_buffer(&mesh.triangles, BufferUsages::INDEX),
            triangle_count: mesh.triangles.len() as u32,
        }
    }

    fn create_buffer<T>(&self, slice: &[T], usage: BufferUsages) -> Buffer
    where
        T: bytemuck::Pod + bytemuck::Zeroable,
    {
        self.device.create_buffer_init(&util::BufferInitDescriptor {
            label: None,
            contents: bytemuck::cast_slice(slice),
            usage,
        })
    }
}

/// The matrix that carries mesh-space normals into world space.
fn normal_matrix(world: Mat4) -> Mat4 {
    if world.determinant().abs() <= f32::EPSILON {
        return world;
    }

    world.inverse().transpose()
}

#[derive(Clone, Copy, Debug)]
#[repr(C)]
struct CameraUniform {
    view_projection: [[f32; 4]; 4],
    eye: [f32; 4],
    fog_color: [f32; 4],
    /// Near distance, far distance, and whether fog is enabled.
    fog: [f32; 4],
}

unsafe impl bytemuck::Pod for CameraUniform {}
unsafe impl bytemuck::Zeroable for CameraUniform {}

#[derive(Clone, Copy, Debug)]
#[repr(C)]
struct ObjectUniform {
    world: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    /// Color and opacity.
    color: [f32; 4],
    emissive: [f32; 4],
}

unsafe impl bytemuck::Pod for ObjectUniform {}
unsafe impl bytemuck::Zeroable for ObjectUniform {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::{Quat, Vec3};

    #[test]
    fn srgb_formats_are_preferred() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb];
        assert_eq!(
            Renderer::choose_surface_format(&formats).unwrap(),
            TextureFormat::Bgra8UnormSrgb
        );
        assert_eq!(
            Renderer::choose_surface_format(&formats[..1]).unwrap(),
            TextureFormat::Bgra8Unorm
        );
        assert!(matches!(
            Renderer::choose_surface_format(&[]),
            Err(Error::NoSupportedSurfaceFormat)
        ));
    }

    #[test]
    fn normals_survive_non_uniform_scale() {
        let world = Mat4::from_scale_rotation_translation(
            Vec3::new(4., 1., 1.),
            Quat::IDENTITY,
            Vec3::new(3., 0., 0.),
        );
        // A 45° slope stretched along X becomes shallower, so its normal tips toward +Y.
        let normal = normal_matrix(world)
            .transform_vector3(Vec3::new(1., 1., 0.).normalize())
            .normalize();
        assert!(normal.y > normal.x);
        assert!((normal.length() - 1.).abs() < 1e-5);
    }

    #[test]
    fn uniforms_match_shader_layouts() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 112);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 160);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }
}
