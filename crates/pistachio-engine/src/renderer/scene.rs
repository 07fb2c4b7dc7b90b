use glam::Mat4;

use crate::error::RenderError;

use super::api::RendererApi;
use super::camera::OrthographicCamera;
use super::command::RenderCommand;
use super::headless::{HeadlessBackend, HeadlessDevice};
use super::shader::Shader;
use super::vertex_array::VertexArray;
use super::wgpu_backend::{WgpuBackend, WgpuDevice};

/// Uniform receiving the scene's view-projection matrix.
pub const VIEW_PROJECTION_UNIFORM: &str = "u_ViewProjection";
/// Uniform receiving the per-object transform.
pub const TRANSFORM_UNIFORM: &str = "u_Transform";

#[derive(Debug, Copy, Clone, PartialEq)]
struct SceneData {
    view_projection: Mat4,
}

/// Draw statistics of one scene.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SceneStats {
    pub draw_calls: u32,
    pub indices: u64,
}

/// Device handle resource factories build on.
enum BackendDevice {
    None,
    Headless(HeadlessDevice),
    Wgpu(WgpuDevice),
}

/// Scene-level rendering context.
///
/// Owns the backend selection, the [`RenderCommand`] façade and the state of
/// the scene being recorded. One instance exists per graphics context and is
/// only touched from the thread running the frame loop.
pub struct Renderer {
    api: RendererApi,
    device: BackendDevice,
    command: RenderCommand,
    scene: Option<SceneData>,
    stats: SceneStats,
}

impl Renderer {
    /// A renderer with no backend. Every resource factory fails on it.
    pub fn unconfigured() -> Self {
        Self {
            api: RendererApi::None,
            device: BackendDevice::None,
            command: RenderCommand::new(Box::new(NoBackend)),
            scene: None,
            stats: SceneStats::default(),
        }
    }

    /// A renderer recording into `device` without touching a GPU.
    pub fn headless(device: HeadlessDevice) -> Self {
        log::info!("renderer api: headless");
        Self {
            api: RendererApi::Headless,
            command: RenderCommand::new(Box::new(HeadlessBackend::new(device.clone()))),
            device: BackendDevice::Headless(device),
            scene: None,
            stats: SceneStats::default(),
        }
    }

    /// A renderer drawing through wgpu.
    pub fn wgpu(device: WgpuDevice) -> Self {
        log::info!("renderer api: wgpu ({:?})", device.surface_format());
        Self {
            api: RendererApi::Wgpu,
            command: RenderCommand::new(Box::new(WgpuBackend::new(device.clone()))),
            device: BackendDevice::Wgpu(device),
            scene: None,
            stats: SceneStats::default(),
        }
    }

    /// The active backend; every resource factory dispatches on it.
    pub fn api(&self) -> RendererApi {
        self.api
    }

    /// Initializes backend state (blending, depth). Call once after construction.
    pub fn init(&mut self) -> Result<(), RenderError> {
        self.command.init()
    }

    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        self.command.set_viewport(0, 0, width, height);
    }

    /// Low-level commands (clear, clear color, viewport).
    pub fn command(&mut self) -> &mut RenderCommand {
        &mut self.command
    }

    pub fn is_scene_active(&self) -> bool {
        self.scene.is_some()
    }

    /// Starts a scene using the camera's current view-projection matrix.
    pub fn begin_scene(&mut self, camera: &OrthographicCamera) -> Result<(), RenderError> {
        if self.scene.is_some() {
            return Err(RenderError::SceneAlreadyActive);
        }
        self.scene = Some(SceneData {
            view_projection: camera.view_projection_matrix(),
        });
        self.stats = SceneStats::default();
        Ok(())
    }

    /// Draws `vertex_array` with `shader` and the per-object `transform`.
    ///
    /// Pass `Mat4::IDENTITY` for untransformed geometry. Shader and vertex
    /// array bindings are left changed afterwards.
    pub fn submit(
        &mut self,
        shader: &dyn Shader,
        vertex_array: &dyn VertexArray,
        transform: Mat4,
    ) -> Result<(), RenderError> {
        let scene = self.scene.ok_or(RenderError::NoActiveScene)?;
        let index_count = vertex_array
            .index_count()
            .ok_or(RenderError::MissingIndexBuffer)?;

        shader.bind();
        shader.set_mat4(VIEW_PROJECTION_UNIFORM, scene.view_projection);
        shader.set_mat4(TRANSFORM_UNIFORM, transform);

        vertex_array.bind();
        self.command.draw_indexed(vertex_array)?;

        self.stats.draw_calls += 1;
        self.stats.indices += u64::from(index_count);
        Ok(())
    }

    pub fn end_scene(&mut self) -> Result<(), RenderError> {
        if self.scene.take().is_none() {
            return Err(RenderError::NoActiveScene);
        }
        log::trace!(
            "scene ended: {} draw calls, {} indices",
            self.stats.draw_calls,
            self.stats.indices
        );
        Ok(())
    }

    /// Statistics of the active scene, or of the last one after `end_scene`.
    pub fn scene_stats(&self) -> SceneStats {
        self.stats
    }

    pub(crate) fn headless_device(&self) -> Result<&HeadlessDevice, RenderError> {
        match &self.device {
            BackendDevice::Headless(device) => Ok(device),
            _ => Err(RenderError::BackendUnavailable(self.api)),
        }
    }

    pub(crate) fn wgpu_device(&self) -> Result<&WgpuDevice, RenderError> {
        match &self.device {
            BackendDevice::Wgpu(device) => Ok(device),
            _ => Err(RenderError::BackendUnavailable(self.api)),
        }
    }
}

/// Backend of an unconfigured renderer: drawing is rejected, the rest is ignored.
struct NoBackend;

impl super::api::RendererBackend for NoBackend {
    fn init(&mut self) -> Result<(), RenderError> {
        Err(RenderError::UnsupportedApi(RendererApi::None))
    }

    fn set_viewport(&mut self, _x: u32, _y: u32, _width: u32, _height: u32) {}

    fn set_clear_color(&mut self, _color: glam::Vec4) {}

    fn clear(&mut self) {}

    fn draw_indexed(&mut self, _vertex_array: &dyn VertexArray) -> Result<(), RenderError> {
        Err(RenderError::UnsupportedApi(RendererApi::None))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::{Vec3, Vec4};

    use super::*;
    use crate::renderer::buffer::{
        create_index_buffer, create_vertex_buffer, BufferElement, BufferLayout, ShaderDataType,
    };
    use crate::renderer::headless::{DrawCall, RecordedCommand};
    use crate::renderer::shader::{create_shader, UniformValue};
    use crate::renderer::texture::{create_texture_2d_from_image, ImageData};
    use crate::renderer::vertex_array::create_vertex_array;

    const SQUARE_VERTICES: [f32; 5 * 4] = [
        -0.5, -0.5, 0.0, 0.0, 0.0, //
        0.5, -0.5, 0.0, 1.0, 0.0, //
        0.5, 0.5, 0.0, 1.0, 1.0, //
        -0.5, 0.5, 0.0, 0.0, 1.0,
    ];
    const SQUARE_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

    fn setup() -> (HeadlessDevice, Renderer) {
        let device = HeadlessDevice::new();
        let mut renderer = Renderer::headless(device.clone());
        renderer.init().unwrap();
        (device, renderer)
    }

    fn square(renderer: &Renderer) -> Rc<dyn VertexArray> {
        let va = create_vertex_array(renderer).unwrap();
        let vb = create_vertex_buffer(renderer, &SQUARE_VERTICES).unwrap();
        vb.set_layout(BufferLayout::new([
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
        ]));
        va.add_vertex_buffer(vb).unwrap();
        va.set_index_buffer(create_index_buffer(renderer, &SQUARE_INDICES).unwrap());
        va
    }

    fn draws(device: &HeadlessDevice) -> Vec<DrawCall> {
        device
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCommand::DrawIndexed(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    fn camera() -> OrthographicCamera {
        let mut camera = OrthographicCamera::new(-1.6, 1.6, -0.9, 0.9);
        camera.set_position(Vec3::new(0.25, 0.5, 0.0));
        camera.set_rotation(15.0);
        camera
    }

    #[test]
    fn empty_scene_emits_no_draw() {
        let (device, mut renderer) = setup();

        renderer.begin_scene(&camera()).unwrap();
        renderer.end_scene().unwrap();

        assert!(draws(&device).is_empty());
        assert_eq!(renderer.scene_stats(), SceneStats::default());
    }

    #[test]
    fn submit_issues_one_indexed_draw_with_scene_uniforms() {
        let (device, mut renderer) = setup();
        let shader = create_shader(&renderer, "FlatColor", "vs", "fs").unwrap();
        let va = square(&renderer);
        let camera = camera();
        let transform = Mat4::from_scale(Vec3::splat(0.1));

        renderer.begin_scene(&camera).unwrap();
        renderer.submit(shader.as_ref(), va.as_ref(), transform).unwrap();
        renderer.end_scene().unwrap();

        let draws = draws(&device);
        assert_eq!(draws.len(), 1);
        let call = &draws[0];
        assert_eq!(call.index_count, 6);
        assert_eq!(call.shader.as_deref(), Some("FlatColor"));
        assert_eq!(
            call.uniforms.get(VIEW_PROJECTION_UNIFORM),
            Some(&UniformValue::Mat4(camera.view_projection_matrix()))
        );
        assert_eq!(
            call.uniforms.get(TRANSFORM_UNIFORM),
            Some(&UniformValue::Mat4(transform))
        );
        assert_eq!(renderer.scene_stats(), SceneStats { draw_calls: 1, indices: 6 });
    }

    #[test]
    fn scene_matrix_is_captured_at_begin_scene() {
        let (device, mut renderer) = setup();
        let shader = create_shader(&renderer, "FlatColor", "vs", "fs").unwrap();
        let va = square(&renderer);
        let mut camera = camera();
        let captured = camera.view_projection_matrix();

        renderer.begin_scene(&camera).unwrap();
        camera.set_position(Vec3::new(9.0, 9.0, 0.0));
        renderer.submit(shader.as_ref(), va.as_ref(), Mat4::IDENTITY).unwrap();
        renderer.end_scene().unwrap();

        assert_eq!(
            draws(&device)[0].uniforms.get(VIEW_PROJECTION_UNIFORM),
            Some(&UniformValue::Mat4(captured))
        );
    }

    #[test]
    fn submit_outside_scene_is_rejected() {
        let (device, mut renderer) = setup();
        let shader = create_shader(&renderer, "FlatColor", "vs", "fs").unwrap();
        let va = square(&renderer);

        assert!(matches!(
            renderer.submit(shader.as_ref(), va.as_ref(), Mat4::IDENTITY),
            Err(RenderError::NoActiveScene)
        ));

        renderer.begin_scene(&camera()).unwrap();
        renderer.end_scene().unwrap();
        assert!(matches!(
            renderer.submit(shader.as_ref(), va.as_ref(), Mat4::IDENTITY),
            Err(RenderError::NoActiveScene)
        ));
        assert!(draws(&device).is_empty());
    }

    #[test]
    fn scene_protocol_rejects_nesting_and_unpaired_end() {
        let (_device, mut renderer) = setup();
        let camera = camera();

        assert!(matches!(renderer.end_scene(), Err(RenderError::NoActiveScene)));

        renderer.begin_scene(&camera).unwrap();
        assert!(matches!(
            renderer.begin_scene(&camera),
            Err(RenderError::SceneAlreadyActive)
        ));
        assert!(renderer.is_scene_active());
        renderer.end_scene().unwrap();
        assert!(!renderer.is_scene_active());
    }

    #[test]
    fn submit_requires_an_index_buffer() {
        let (device, mut renderer) = setup();
        let shader = create_shader(&renderer, "FlatColor", "vs", "fs").unwrap();
        let va = create_vertex_array(&renderer).unwrap();

        renderer.begin_scene(&camera()).unwrap();
        assert!(matches!(
            renderer.submit(shader.as_ref(), va.as_ref(), Mat4::IDENTITY),
            Err(RenderError::MissingIndexBuffer)
        ));
        renderer.end_scene().unwrap();
        assert!(draws(&device).is_empty());
    }

    #[test]
    fn switching_textures_keeps_index_count() {
        let (device, mut renderer) = setup();
        let shader = create_shader(&renderer, "Texture", "vs", "fs").unwrap();
        let va = square(&renderer);
        let image = ImageData {
            width: 2,
            height: 2,
            channels: 4,
            pixels: vec![255; 16],
        };
        let checkerboard = create_texture_2d_from_image(&renderer, &image).unwrap();
        let logo = create_texture_2d_from_image(&renderer, &image).unwrap();
        let transform = Mat4::from_scale(Vec3::splat(1.5));

        renderer.begin_scene(&camera()).unwrap();
        checkerboard.bind(0);
        renderer.submit(shader.as_ref(), va.as_ref(), transform).unwrap();
        logo.bind(0);
        renderer.submit(shader.as_ref(), va.as_ref(), transform).unwrap();
        renderer.end_scene().unwrap();

        let draws = draws(&device);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].index_count, 6);
        assert_eq!(draws[1].index_count, 6);
        assert_eq!(draws[0].vertex_array, draws[1].vertex_array);
        assert_ne!(draws[0].textures[0], draws[1].textures[0]);
        assert!(draws[0].textures[0].is_some());
    }

    #[test]
    fn uniforms_set_by_client_travel_with_the_draw() {
        let (device, mut renderer) = setup();
        let shader = create_shader(&renderer, "FlatColor", "vs", "fs").unwrap();
        let va = square(&renderer);

        renderer.begin_scene(&camera()).unwrap();
        shader.set_float4("u_Color", Vec4::new(0.2, 0.3, 0.8, 1.0));
        renderer.submit(shader.as_ref(), va.as_ref(), Mat4::IDENTITY).unwrap();
        shader.set_float4("u_Color", Vec4::ONE);
        renderer.submit(shader.as_ref(), va.as_ref(), Mat4::IDENTITY).unwrap();
        renderer.end_scene().unwrap();

        let draws = draws(&device);
        assert_eq!(
            draws[0].uniforms.get("u_Color"),
            Some(&UniformValue::Float4(Vec4::new(0.2, 0.3, 0.8, 1.0)))
        );
        assert_eq!(draws[1].uniforms.get("u_Color"), Some(&UniformValue::Float4(Vec4::ONE)));
    }

    #[test]
    fn commands_are_forwarded_in_order() {
        let (device, mut renderer) = setup();
        device.take_commands();

        renderer.on_window_resize(800, 600);
        renderer.command().set_clear_color(Vec4::new(0.1, 0.1, 0.1, 1.0));
        renderer.command().clear();

        assert_eq!(
            device.commands(),
            [
                RecordedCommand::SetViewport { x: 0, y: 0, width: 800, height: 600 },
                RecordedCommand::SetClearColor(Vec4::new(0.1, 0.1, 0.1, 1.0)),
                RecordedCommand::Clear,
            ]
        );
    }

    #[test]
    fn unconfigured_renderer_cannot_draw() {
        let mut renderer = Renderer::unconfigured();
        assert_eq!(renderer.api(), RendererApi::None);
        assert!(matches!(renderer.init(), Err(RenderError::UnsupportedApi(RendererApi::None))));
        assert!(matches!(
            create_vertex_array(&renderer),
            Err(RenderError::UnsupportedApi(RendererApi::None))
        ));
    }
}
