use std::borrow::Cow;

#[allow(dead_code)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// Compiles GLSL into a SPIR-V shader module source.
///
/// Returns `None` and logs if compilation fails, so a broken shader edit
/// keeps the previous pipeline instead of tearing the app down.
pub fn load_glsl(code: &str, stage: ShaderStage) -> Option<wgpu::ShaderModuleSource<'static>> {
    let ty = match stage {
        ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
        ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
        ShaderStage::Compute => shaderc::ShaderKind::Compute,
    };

    let mut compiler = shaderc::Compiler::new()?;
    match compiler.compile_into_spirv(code, ty, "shader.glsl", "main", None) {
        Ok(binary) => Some(wgpu::ShaderModuleSource::SpirV(Cow::Owned(
            binary.as_binary().to_vec(),
        ))),
        Err(e) => {
            log::warn!("Shader compilation failed. Reason:\r\n{}", e);
            None
        }
    }
}

/// Reinterprets a vertex slice as raw bytes for buffer uploads.
pub fn as_bytes<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            slice.as_ptr() as *const u8,
            slice.len() * std::mem::size_of::<T>(),
        )
    }
}
