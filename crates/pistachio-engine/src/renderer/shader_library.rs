use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::error::RenderError;

use super::shader::{create_shader_from_file, Shader};
use super::Renderer;

/// Named registry of compiled shaders.
///
/// Names are unique: adding a name twice fails and leaves the registry as it was.
#[derive(Default)]
pub struct ShaderLibrary {
    shaders: HashMap<String, Rc<dyn Shader>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `shader` under its own name.
    pub fn add(&mut self, shader: Rc<dyn Shader>) -> Result<(), RenderError> {
        let name = shader.name().to_string();
        self.add_named(name, shader)
    }

    /// Registers `shader` under `name`.
    pub fn add_named(
        &mut self,
        name: impl Into<String>,
        shader: Rc<dyn Shader>,
    ) -> Result<(), RenderError> {
        let name = name.into();
        if self.exists(&name) {
            return Err(RenderError::DuplicateShader(name));
        }
        log::debug!("shader library: added `{name}`");
        self.shaders.insert(name, shader);
        Ok(())
    }

    /// Creates a shader from a combined source file and registers it under
    /// the file stem.
    pub fn load(
        &mut self,
        renderer: &Renderer,
        path: impl AsRef<Path>,
    ) -> Result<Rc<dyn Shader>, RenderError> {
        let shader = create_shader_from_file(renderer, path)?;
        self.add(Rc::clone(&shader))?;
        Ok(shader)
    }

    /// Creates a shader from a combined source file and registers it under `name`.
    ///
    /// The name is checked before the file is read, so a duplicate never
    /// compiles a program.
    pub fn load_named(
        &mut self,
        renderer: &Renderer,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Rc<dyn Shader>, RenderError> {
        let name = name.into();
        if self.exists(&name) {
            return Err(RenderError::DuplicateShader(name));
        }
        let shader = create_shader_from_file(renderer, path)?;
        self.add_named(name, Rc::clone(&shader))?;
        Ok(shader)
    }

    pub fn get(&self, name: &str) -> Result<Rc<dyn Shader>, RenderError> {
        self.shaders
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::ShaderNotFound(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shaders.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessDevice;
    use crate::renderer::shader::create_shader;

    fn renderer() -> Renderer {
        Renderer::headless(HeadlessDevice::new())
    }

    fn write_temp_shader(file_name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("pistachio-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        std::fs::write(&path, "#type vertex\nvs\n#type fragment\nfs\n").unwrap();
        path
    }

    #[test]
    fn added_shader_is_found_by_name() {
        let renderer = renderer();
        let mut library = ShaderLibrary::new();
        let shader = create_shader(&renderer, "FlatColor", "vs", "fs").unwrap();

        library.add(Rc::clone(&shader)).unwrap();

        assert!(library.exists("FlatColor"));
        assert!(Rc::ptr_eq(&library.get("FlatColor").unwrap(), &shader));
    }

    #[test]
    fn explicit_name_overrides_shader_name() {
        let renderer = renderer();
        let mut library = ShaderLibrary::new();
        let shader = create_shader(&renderer, "FlatColor", "vs", "fs").unwrap();

        library.add_named("Solid", shader).unwrap();

        assert!(library.exists("Solid"));
        assert!(!library.exists("FlatColor"));
    }

    #[test]
    fn duplicate_add_fails_without_replacing() {
        let renderer = renderer();
        let mut library = ShaderLibrary::new();
        let first = create_shader(&renderer, "FlatColor", "vs", "fs").unwrap();
        let second = create_shader(&renderer, "FlatColor", "vs2", "fs2").unwrap();

        library.add(Rc::clone(&first)).unwrap();
        let err = library.add(second).unwrap_err();

        assert!(matches!(err, RenderError::DuplicateShader(ref n) if n == "FlatColor"));
        assert_eq!(library.len(), 1);
        assert!(Rc::ptr_eq(&library.get("FlatColor").unwrap(), &first));
    }

    #[test]
    fn missing_name_is_an_error() {
        let library = ShaderLibrary::new();
        assert!(!library.exists("Texture"));
        assert!(matches!(library.get("Texture"), Err(RenderError::ShaderNotFound(n)) if n == "Texture"));
    }

    #[test]
    fn load_registers_under_file_stem() {
        let renderer = renderer();
        let mut library = ShaderLibrary::new();
        let path = write_temp_shader("Texture.wgsl");

        let shader = library.load(&renderer, &path).unwrap();

        assert_eq!(shader.name(), "Texture");
        assert!(Rc::ptr_eq(&library.get("Texture").unwrap(), &shader));
    }

    #[test]
    fn load_named_rejects_taken_name() {
        let renderer = renderer();
        let mut library = ShaderLibrary::new();
        let path = write_temp_shader("Sprite.wgsl");

        library.load_named(&renderer, "Sprite", &path).unwrap();
        assert!(matches!(
            library.load_named(&renderer, "Sprite", &path),
            Err(RenderError::DuplicateShader(_))
        ));
        assert_eq!(library.names().collect::<Vec<_>>(), ["Sprite"]);
    }

    #[test]
    fn load_without_backend_leaves_library_empty() {
        let renderer = Renderer::unconfigured();
        let mut library = ShaderLibrary::new();
        let path = write_temp_shader("Unused.wgsl");

        assert!(library.load(&renderer, &path).is_err());
        assert!(library.is_empty());
    }
}
