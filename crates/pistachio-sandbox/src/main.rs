use std::rc::Rc;

use anyhow::Result;
use glam::{Mat4, Vec3, Vec4};

use pistachio_engine::events::Event;
use pistachio_engine::input::Key;
use pistachio_engine::renderer::{
    create_index_buffer, create_shader, create_texture_2d_from_image, create_vertex_array,
    create_vertex_buffer, BufferElement, BufferLayout, ImageData, OrthographicCamera, Renderer,
    Shader, ShaderDataType, ShaderLibrary, Texture, Texture2D, VertexArray, VertexBuffer,
};
use pistachio_engine::{EngineConfig, FrameCtx, Layer};

const TEXTURE_SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/shaders/Texture.wgsl");

const FLAT_COLOR_VERTEX: &str = r#"
struct Uniforms {
    u_ViewProjection: mat4x4<f32>,
    u_Transform: mat4x4<f32>,
    u_Color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) a_Position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.u_ViewProjection * u.u_Transform * vec4<f32>(a_Position, 1.0);
}
"#;

const FLAT_COLOR_FRAGMENT: &str = r#"
struct Uniforms {
    u_ViewProjection: mat4x4<f32>,
    u_Transform: mat4x4<f32>,
    u_Color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.u_Color;
}
"#;

const GRID_SIZE: i32 = 20;
const CAMERA_SPEED: f32 = 5.0;
/// Degrees per second.
const CAMERA_ROTATION_SPEED: f32 = 180.0;

/// Flat-colored grid plus two textured quads under a keyboard-driven camera.
struct ExampleLayer {
    camera: OrthographicCamera,
    shaders: ShaderLibrary,
    flat_color: Rc<dyn Shader>,
    square: Rc<dyn VertexArray>,
    checkerboard: Rc<dyn Texture2D>,
    badge: Rc<dyn Texture2D>,
    show_grid: bool,
}

impl ExampleLayer {
    fn new(renderer: &Renderer) -> Result<Self> {
        #[rustfmt::skip]
        let vertices: [f32; 5 * 4] = [
            -0.5, -0.5, 0.0, 0.0, 0.0,
             0.5, -0.5, 0.0, 1.0, 0.0,
             0.5,  0.5, 0.0, 1.0, 1.0,
            -0.5,  0.5, 0.0, 0.0, 1.0,
        ];
        let vertex_buffer = create_vertex_buffer(renderer, &vertices)?;
        vertex_buffer.set_layout(BufferLayout::new([
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
        ]));

        let square = create_vertex_array(renderer)?;
        square.add_vertex_buffer(vertex_buffer)?;
        square.set_index_buffer(create_index_buffer(renderer, &[0, 1, 2, 2, 3, 0])?);

        let mut shaders = ShaderLibrary::new();
        let flat_color = create_shader(renderer, "FlatColor", FLAT_COLOR_VERTEX, FLAT_COLOR_FRAGMENT)?;
        shaders.add(Rc::clone(&flat_color))?;

        let texture = shaders.load(renderer, TEXTURE_SHADER)?;
        texture.bind();
        texture.set_int("u_Texture", 0);

        Ok(Self {
            camera: OrthographicCamera::new(-1.6, 1.6, -0.9, 0.9),
            shaders,
            flat_color,
            square,
            checkerboard: create_texture_2d_from_image(renderer, &checkerboard(8))?,
            badge: create_texture_2d_from_image(renderer, &badge(64))?,
            show_grid: true,
        })
    }

    fn move_camera(&mut self, ctx: &FrameCtx<'_>) {
        let ts = ctx.timestep().seconds();
        let mut position = self.camera.position();
        let mut rotation = self.camera.rotation();

        if ctx.input.is_key_pressed(Key::ArrowLeft) {
            position.x -= CAMERA_SPEED * ts;
        } else if ctx.input.is_key_pressed(Key::ArrowRight) {
            position.x += CAMERA_SPEED * ts;
        }
        if ctx.input.is_key_pressed(Key::ArrowUp) {
            position.y += CAMERA_SPEED * ts;
        } else if ctx.input.is_key_pressed(Key::ArrowDown) {
            position.y -= CAMERA_SPEED * ts;
        }

        if ctx.input.is_key_pressed(Key::A) {
            rotation += CAMERA_ROTATION_SPEED * ts;
        }
        if ctx.input.is_key_pressed(Key::D) {
            rotation -= CAMERA_ROTATION_SPEED * ts;
        }

        self.camera.set_position(position);
        self.camera.set_rotation(rotation);
    }
}

impl Layer for ExampleLayer {
    fn name(&self) -> &str {
        "Example"
    }

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        self.move_camera(ctx);

        let renderer = &mut *ctx.renderer;
        renderer.command().set_clear_color(Vec4::new(0.1, 0.1, 0.1, 1.0));
        renderer.command().clear();

        renderer.begin_scene(&self.camera)?;

        if self.show_grid {
            let scale = Mat4::from_scale(Vec3::splat(0.1));
            let red = Vec4::new(0.8, 0.2, 0.3, 1.0);
            let blue = Vec4::new(0.2, 0.3, 0.8, 1.0);
            for y in 0..GRID_SIZE {
                for x in 0..GRID_SIZE {
                    let position = Vec3::new(x as f32 * 0.11, y as f32 * 0.11, 0.0);
                    let color = if (x + y) % 2 == 0 { red } else { blue };
                    self.flat_color.set_float4("u_Color", color);
                    renderer.submit(
                        self.flat_color.as_ref(),
                        self.square.as_ref(),
                        Mat4::from_translation(position) * scale,
                    )?;
                }
            }
        }

        let texture = self.shaders.get("Texture")?;
        let big = Mat4::from_scale(Vec3::splat(1.5));

        self.checkerboard.bind(0);
        texture.set_float("u_TilingFactor", 10.0);
        renderer.submit(texture.as_ref(), self.square.as_ref(), big)?;

        self.badge.bind(0);
        texture.set_float("u_TilingFactor", 1.0);
        renderer.submit(texture.as_ref(), self.square.as_ref(), big)?;

        renderer.end_scene()?;
        Ok(())
    }

    fn on_event(&mut self, event: &Event) -> bool {
        match event {
            Event::KeyPressed {
                key: Key::G,
                repeat_count: 0,
            } => {
                self.show_grid = !self.show_grid;
                log::info!("grid {}", if self.show_grid { "shown" } else { "hidden" });
                true
            }
            _ => false,
        }
    }
}

/// Light and dark gray squares, `cells` x `cells`, eight texels each.
fn checkerboard(cells: u32) -> ImageData {
    let size = cells * 8;
    let mut pixels = Vec::with_capacity((size * size * 3) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / 8) + (y / 8)) % 2 == 0;
            let v = if light { 0xcc } else { 0x55 };
            pixels.extend_from_slice(&[v, v, v]);
        }
    }
    ImageData {
        width: size,
        height: size,
        channels: 3,
        pixels,
    }
}

/// Orange disc with a soft edge on a transparent background.
fn badge(size: u32) -> ImageData {
    let center = size as f32 / 2.0;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let distance = (dx * dx + dy * dy).sqrt() / center;
            let alpha = ((1.0 - distance) * 8.0).clamp(0.0, 1.0);
            pixels.extend_from_slice(&[0xf2, 0x8c, 0x28, (alpha * 255.0) as u8]);
        }
    }
    ImageData {
        width: size,
        height: size,
        channels: 4,
        pixels,
    }
}

fn main() -> Result<()> {
    let config = EngineConfig::from_env()?;
    pistachio_engine::run(config, |app| {
        let layer = ExampleLayer::new(app.renderer())?;
        app.push_layer(Box::new(layer))
    })
}

#[cfg(test)]
mod tests {
    use pistachio_engine::renderer::headless::HeadlessDevice;

    use super::*;

    #[test]
    fn procedural_images_are_valid() {
        checkerboard(8).validate().unwrap();
        badge(64).validate().unwrap();
    }

    #[test]
    fn example_layer_runs_headless() {
        let app = pistachio_engine::run_headless(3, |app| {
            let layer = ExampleLayer::new(app.renderer())?;
            app.push_layer(Box::new(layer))
        })
        .unwrap();

        let stats = app.renderer().scene_stats();
        assert_eq!(stats.draw_calls, (GRID_SIZE * GRID_SIZE) as u32 + 2);
        assert_eq!(stats.indices, u64::from(stats.draw_calls) * 6);
    }

    #[test]
    fn g_toggles_the_grid() {
        let renderer = Renderer::headless(HeadlessDevice::new());
        let mut layer = ExampleLayer::new(&renderer).unwrap();

        let press = Event::KeyPressed {
            key: Key::G,
            repeat_count: 0,
        };
        assert!(layer.on_event(&press));
        assert!(!layer.show_grid);
        assert!(!layer.on_event(&Event::KeyPressed {
            key: Key::G,
            repeat_count: 1,
        }));
    }
}
