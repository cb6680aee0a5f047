/// WebGL2 renderer: one Lambert program, vertex arrays cached per geometry
use std::collections::HashMap;
use std::rc::Rc;

use nalgebra::{Matrix4, Point3};
use skyfolio_core::light::ambient_term;
use skyfolio_core::{Color, Geometry, Light, Material, PerspectiveCamera, Renderer, Scene};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::buffers::{interleave, PrimitiveMode, FLOATS_PER_VERTEX};

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec3 a_color;

uniform mat4 u_model;
uniform mat4 u_view;
uniform mat4 u_projection;

out vec3 v_world;
out vec3 v_normal;
out vec3 v_color;

void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    v_world = world.xyz;
    v_normal = mat3(u_model) * a_normal;
    v_color = a_color;
    gl_Position = u_projection * u_view * world;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec3 v_world;
in vec3 v_normal;
in vec3 v_color;

uniform vec3 u_color;
uniform vec3 u_emissive;
uniform vec3 u_ambient;
uniform vec3 u_light_position;
uniform vec3 u_light_color;
uniform float u_light_distance;
uniform bool u_lit;

out vec4 out_color;

void main() {
    vec3 base = u_color * v_color;
    if (!u_lit) {
        out_color = vec4(base, 1.0);
        return;
    }

    vec3 to_light = u_light_position - v_world;
    float reach = max(length(to_light), 1e-4);
    float falloff = u_light_distance > 0.0 ? clamp(1.0 - reach / u_light_distance, 0.0, 1.0) : 1.0;
    float lambert = max(dot(normalize(v_normal), to_light / reach), 0.0);

    out_color = vec4(base * (u_ambient + u_light_color * lambert * falloff) + u_emissive, 1.0);
}
"#;

struct Uniforms {
    model: Option<WebGlUniformLocation>,
    view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    emissive: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    light_position: Option<WebGlUniformLocation>,
    light_color: Option<WebGlUniformLocation>,
    light_distance: Option<WebGlUniformLocation>,
    lit: Option<WebGlUniformLocation>,
}

impl Uniforms {
    fn locate(gl: &Gl, program: &WebGlProgram) -> Self {
        let at = |name: &str| gl.get_uniform_location(program, name);
        Self {
            model: at("u_model"),
            view: at("u_view"),
            projection: at("u_projection"),
            color: at("u_color"),
            emissive: at("u_emissive"),
            ambient: at("u_ambient"),
            light_position: at("u_light_position"),
            light_color: at("u_light_color"),
            light_distance: at("u_light_distance"),
            lit: at("u_lit"),
        }
    }
}

struct GpuGeometry {
    vao: WebGlVertexArrayObject,
    count: i32,
    mode: u32,
}

/// Cache key: the shared geometry's address plus how it is drawn
type GeometryKey = (usize, bool);

pub struct WebGlRenderer {
    canvas: HtmlCanvasElement,
    gl: Gl,
    program: WebGlProgram,
    uniforms: Uniforms,
    geometries: HashMap<GeometryKey, GpuGeometry>,
    // Keeps cached geometries alive so their addresses are not reused
    retained: Vec<Rc<Geometry>>,
}

impl WebGlRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| JsValue::from_str("WebGL2 is not available"))?
            .dyn_into::<Gl>()?;

        let vertex = compile_shader(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile_shader(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vertex, &fragment)?;
        let uniforms = Uniforms::locate(&gl, &program);

        gl.enable(Gl::DEPTH_TEST);
        // Transparent clear lets the CSS background show through
        gl.clear_color(0.0, 0.0, 0.0, 0.0);

        Ok(Self {
            canvas,
            gl,
            program,
            uniforms,
            geometries: HashMap::new(),
            retained: Vec::new(),
        })
    }

    fn upload(&mut self, geometry: &Rc<Geometry>, wireframe: bool) -> Result<GeometryKey, JsValue> {
        let key = (Rc::as_ptr(geometry) as usize, wireframe);
        if self.geometries.contains_key(&key) {
            return Ok(key);
        }

        let vertices = interleave(geometry, wireframe);
        let gl = &self.gl;

        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| JsValue::from_str("failed to create vertex array"))?;
        let buffer = gl
            .create_buffer()
            .ok_or_else(|| JsValue::from_str("failed to create buffer"))?;

        gl.bind_vertex_array(Some(&vao));
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        let array = js_sys::Float32Array::from(vertices.data.as_slice());
        gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);

        let stride = (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as i32;
        for (location, offset) in [(0u32, 0i32), (1, 3), (2, 6)] {
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_with_i32(location, 3, Gl::FLOAT, false, stride, offset * 4);
        }
        gl.bind_vertex_array(None);

        let mode = match vertices.mode {
            PrimitiveMode::Triangles => Gl::TRIANGLES,
            PrimitiveMode::Lines => Gl::LINES,
        };
        self.geometries.insert(
            key,
            GpuGeometry {
                vao,
                count: vertices.vertex_count() as i32,
                mode,
            },
        );
        self.retained.push(Rc::clone(geometry));
        log::debug!("uploaded geometry with {} vertices", vertices.vertex_count());
        Ok(key)
    }

    fn set_lights(&self, lights: &[Light]) {
        let (gl, uniforms) = (&self.gl, &self.uniforms);
        let ambient = ambient_term(lights).to_array();
        gl.uniform3fv_with_f32_array(uniforms.ambient.as_ref(), &ambient);

        // The shader takes a single point light; the first one wins
        let point = lights.iter().find_map(|light| match light {
            Light::Point {
                color,
                intensity,
                distance,
                position,
            } => Some((color.scale(*intensity), *distance, *position)),
            Light::Ambient { .. } => None,
        });
        let (color, distance, position) = point.unwrap_or((Color::BLACK, 0.0, Point3::origin()));
        gl.uniform3fv_with_f32_array(uniforms.light_color.as_ref(), &color.to_array());
        gl.uniform3fv_with_f32_array(uniforms.light_position.as_ref(), position.coords.as_slice());
        gl.uniform1f(uniforms.light_distance.as_ref(), distance);
    }

    fn set_matrix(&self, location: Option<&WebGlUniformLocation>, matrix: &Matrix4<f32>) {
        self.gl
            .uniform_matrix4fv_with_f32_array(location, false, matrix.as_slice());
    }
}

impl Renderer for WebGlRenderer {
    type Error = JsValue;

    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), JsValue> {
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        self.gl.use_program(Some(&self.program));

        self.set_matrix(self.uniforms.view.as_ref(), &camera.view_matrix());
        self.set_matrix(self.uniforms.projection.as_ref(), camera.projection_matrix());
        self.set_lights(scene.lights());

        for (_, object) in scene.objects() {
            if !object.visible {
                continue;
            }

            let wireframe = object.material.is_wireframe();
            let key = self.upload(&object.geometry, wireframe)?;
            let Some(gpu) = self.geometries.get(&key) else {
                continue;
            };
            if gpu.count == 0 {
                continue;
            }

            let (emissive, lit) = match &object.material {
                Material::Standard(material) => (material.emissive, !material.wireframe),
                Material::LineBasic { .. } => (Color::BLACK, false),
            };

            let gl = &self.gl;
            gl.uniform_matrix4fv_with_f32_array(
                self.uniforms.model.as_ref(),
                false,
                object.transform.model_matrix().as_slice(),
            );
            let color = object.material.base_color().to_array();
            gl.uniform3fv_with_f32_array(self.uniforms.color.as_ref(), &color);
            gl.uniform3fv_with_f32_array(self.uniforms.emissive.as_ref(), &emissive.to_array());
            gl.uniform1i(self.uniforms.lit.as_ref(), lit as i32);

            gl.bind_vertex_array(Some(&gpu.vao));
            gl.draw_arrays(gpu.mode, 0, gpu.count);
        }
        self.gl.bind_vertex_array(None);

        Ok(())
    }
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| JsValue::from_str("failed to create shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let log = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown shader compile error".to_string());
        Err(JsValue::from_str(&log))
    }
}

fn link_program(
    gl: &Gl,
    vertex: &WebGlShader,
    fragment: &WebGlShader,
) -> Result<WebGlProgram, JsValue> {
    let program = gl
        .create_program()
        .ok_or_else(|| JsValue::from_str("failed to create program"))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    let linked = gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if linked {
        Ok(program)
    } else {
        let log = gl
            .get_program_info_log(&program)
            .unwrap_or_else(|| "unknown program link error".to_string());
        Err(JsValue::from_str(&log))
    }
}
