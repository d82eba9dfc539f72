//! Shader programs: CPU-side compile and link, then GPU pipeline creation.
//!
//! A program is a vertex source and a fragment source, each a standalone WGSL
//! module. `compile` parses and validates both with naga and links them by
//! reflection, so every error that can be detected without a device is
//! reported before any GPU object exists. `ShaderProgram::new` then builds the
//! modules, the bind group derived from the reflected uniforms and the render
//! pipeline.
//!
//! Conventions:
//! - entry points are `vs_main` (vertex) and `fs_main` (fragment)
//! - uniforms live in bind group 0; a uniform's binding index is its location
//! - a uniform declared by both stages at the same binding must agree in name
//!   and size

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::error::{RenderError, ShaderBuildError, ShaderStage};
use super::RenderCtx;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Process-unique program identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProgramId(u64);

impl ProgramId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A reflected uniform buffer binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    /// Binding index in group 0. Stable for the program's lifetime.
    pub location: u32,
    /// Size in bytes of the WGSL type.
    pub size: u64,
    pub stages: wgpu::ShaderStages,
}

/// Identity and uniform name table of a linked program.
///
/// Only produced by a successful link.
#[derive(Debug, Clone)]
pub struct ShaderHandle {
    program: ProgramId,
    uniform_locations: HashMap<String, u32>,
}

impl ShaderHandle {
    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        self.uniform_locations.get(name).copied()
    }
}

/// Output of a successful `compile`: sources plus link-time reflection.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    handle: ShaderHandle,
    vertex_source: String,
    fragment_source: String,
    uniforms: Vec<UniformSlot>,
    vertex_inputs: BTreeSet<u32>,
}

impl CompiledProgram {
    pub fn handle(&self) -> &ShaderHandle {
        &self.handle
    }

    /// Reflected uniforms ordered by location.
    pub fn uniforms(&self) -> &[UniformSlot] {
        &self.uniforms
    }

    /// Attribute locations consumed by `vs_main`.
    pub fn vertex_inputs(&self) -> impl Iterator<Item = u32> + '_ {
        self.vertex_inputs.iter().copied()
    }
}

/// Compiles and links a vertex/fragment pair.
pub fn compile(vertex_src: &str, fragment_src: &str) -> Result<CompiledProgram, ShaderBuildError> {
    let vertex = StageModule::parse(ShaderStage::Vertex, vertex_src)?;
    let fragment = StageModule::parse(ShaderStage::Fragment, fragment_src)?;

    let program = link(&vertex, &fragment)?;
    log::debug!(
        "linked program {} ({} uniform(s), inputs {:?})",
        program.handle.program.get(),
        program.uniforms.len(),
        program.vertex_inputs
    );
    Ok(program)
}

struct StageModule<'a> {
    stage: ShaderStage,
    source: &'a str,
    module: naga::Module,
}

impl<'a> StageModule<'a> {
    fn parse(stage: ShaderStage, source: &'a str) -> Result<Self, ShaderBuildError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| ShaderBuildError::compile(stage, e.emit_to_string(source)))?;

        Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .map_err(|e| ShaderBuildError::compile(stage, e.emit_to_string(source)))?;

        Ok(Self {
            stage,
            source,
            module,
        })
    }

    fn entry_point(&self, name: &str) -> Option<&naga::EntryPoint> {
        let stage = match self.stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        };
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage && ep.name == name)
    }

    /// Uniform buffers by binding index, with their names and sizes.
    fn uniforms(&self) -> Result<BTreeMap<u32, (String, u64)>, ShaderBuildError> {
        let mut out = BTreeMap::new();

        for (_, var) in self.module.global_variables.iter() {
            let Some(binding) = &var.binding else { continue };
            let name = var
                .name
                .clone()
                .unwrap_or_else(|| format!("binding{}", binding.binding));

            if var.space != naga::AddressSpace::Uniform {
                return Err(ShaderBuildError::link(format!(
                    "{} resource `{name}` is not a uniform buffer; only uniform buffers are supported",
                    self.stage
                )));
            }
            if binding.group != 0 {
                return Err(ShaderBuildError::link(format!(
                    "{} uniform `{name}` is in bind group {}; only group 0 is supported",
                    self.stage, binding.group
                )));
            }

            let size = self.module.types[var.ty].inner.size(self.module.to_ctx()) as u64;
            out.insert(binding.binding, (name, size));
        }

        Ok(out)
    }

    fn source_len(&self) -> usize {
        self.source.len()
    }
}

fn link(vertex: &StageModule<'_>, fragment: &StageModule<'_>) -> Result<CompiledProgram, ShaderBuildError> {
    let vs = vertex.entry_point(VERTEX_ENTRY).ok_or_else(|| {
        ShaderBuildError::link(format!("vertex source has no `@vertex fn {VERTEX_ENTRY}`"))
    })?;
    let fs = fragment.entry_point(FRAGMENT_ENTRY).ok_or_else(|| {
        ShaderBuildError::link(format!("fragment source has no `@fragment fn {FRAGMENT_ENTRY}`"))
    })?;

    // Fragment inputs must be written by the vertex stage.
    let mut vs_outputs = BTreeSet::new();
    if let Some(result) = &vs.function.result {
        collect_locations(&vertex.module, result.binding.as_ref(), result.ty, &mut vs_outputs);
    }
    let mut fs_inputs = BTreeSet::new();
    for arg in &fs.function.arguments {
        collect_locations(&fragment.module, arg.binding.as_ref(), arg.ty, &mut fs_inputs);
    }
    let unwritten: Vec<u32> = fs_inputs.difference(&vs_outputs).copied().collect();
    if !unwritten.is_empty() {
        return Err(ShaderBuildError::link(format!(
            "fragment input location(s) {unwritten:?} are not written by `{VERTEX_ENTRY}`"
        )));
    }

    let mut vertex_inputs = BTreeSet::new();
    for arg in &vs.function.arguments {
        collect_locations(&vertex.module, arg.binding.as_ref(), arg.ty, &mut vertex_inputs);
    }

    let uniforms = merge_uniforms(vertex.uniforms()?, fragment.uniforms()?)?;

    log::trace!(
        "linking {} + {} bytes of WGSL",
        vertex.source_len(),
        fragment.source_len()
    );

    let uniform_locations = uniforms
        .iter()
        .map(|u| (u.name.clone(), u.location))
        .collect::<HashMap<_, _>>();
    if uniform_locations.len() != uniforms.len() {
        return Err(ShaderBuildError::link(
            "the same uniform name is bound at more than one location",
        ));
    }

    Ok(CompiledProgram {
        handle: ShaderHandle {
            program: ProgramId::next(),
            uniform_locations,
        },
        vertex_source: vertex.source.to_string(),
        fragment_source: fragment.source.to_string(),
        uniforms,
        vertex_inputs,
    })
}

fn merge_uniforms(
    vertex: BTreeMap<u32, (String, u64)>,
    mut fragment: BTreeMap<u32, (String, u64)>,
) -> Result<Vec<UniformSlot>, ShaderBuildError> {
    let mut out = Vec::with_capacity(vertex.len() + fragment.len());

    for (location, (name, size)) in vertex {
        let mut stages = wgpu::ShaderStages::VERTEX;
        if let Some((fs_name, fs_size)) = fragment.remove(&location) {
            if fs_name != name || fs_size != size {
                return Err(ShaderBuildError::link(format!(
                    "binding {location} is `{name}` ({size} bytes) in the vertex stage \
                     but `{fs_name}` ({fs_size} bytes) in the fragment stage"
                )));
            }
            stages |= wgpu::ShaderStages::FRAGMENT;
        }
        out.push(UniformSlot {
            name,
            location,
            size,
            stages,
        });
    }

    out.extend(fragment.into_iter().map(|(location, (name, size))| UniformSlot {
        name,
        location,
        size,
        stages: wgpu::ShaderStages::FRAGMENT,
    }));
    out.sort_by_key(|u| u.location);
    Ok(out)
}

/// Collects `@location` indices of an entry point argument or result,
/// descending into IO structs.
fn collect_locations(
    module: &naga::Module,
    binding: Option<&naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut BTreeSet<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.insert(*location);
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

pub(crate) fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

/// Fixed-function state for `ShaderProgram::new`.
pub struct ShaderProgramDesc<'a> {
    pub label: &'a str,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub topology: wgpu::PrimitiveTopology,
    pub blend: Option<wgpu::BlendState>,
}

struct UniformBinding {
    slot: UniformSlot,
    buffer: wgpu::Buffer,
}

/// A linked program with its GPU pipeline and uniform storage.
pub struct ShaderProgram {
    handle: ShaderHandle,
    uniforms: Vec<UniformBinding>,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    /// Creates the GPU objects for `compiled`.
    ///
    /// Fails with `ShaderBuildError::Link` when the vertex buffers do not feed
    /// every attribute `vs_main` reads, or when the device rejects any object.
    pub fn new(
        ctx: &RenderCtx<'_>,
        compiled: &CompiledProgram,
        desc: &ShaderProgramDesc<'_>,
    ) -> Result<Self, ShaderBuildError> {
        let provided: BTreeSet<u32> = desc
            .vertex_buffers
            .iter()
            .flat_map(|layout| layout.attributes.iter().map(|a| a.shader_location))
            .collect();
        let unfed: Vec<u32> = compiled.vertex_inputs.difference(&provided).copied().collect();
        if !unfed.is_empty() {
            return Err(ShaderBuildError::link(format!(
                "{}: vertex input location(s) {unfed:?} have no buffer attribute",
                desc.label
            )));
        }

        if let Some(stale) = ctx.errors.take_joined() {
            log::warn!("discarding gpu errors raised before building `{}`: {stale}", desc.label);
        }

        let vs_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vs", desc.label)),
            source: wgpu::ShaderSource::Wgsl(compiled.vertex_source.as_str().into()),
        });
        let fs_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fs", desc.label)),
            source: wgpu::ShaderSource::Wgsl(compiled.fragment_source.as_str().into()),
        });

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = compiled
            .uniforms
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.location,
                visibility: slot.stages,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(slot.size),
                },
                count: None,
            })
            .collect();

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{} bgl", desc.label)),
                entries: &layout_entries,
            });

        let uniforms: Vec<UniformBinding> = compiled
            .uniforms
            .iter()
            .map(|slot| UniformBinding {
                buffer: ctx.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{} {} ubo", desc.label, slot.name)),
                    size: uniform_buffer_size(slot.size),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                slot: slot.clone(),
            })
            .collect();

        let group_entries: Vec<wgpu::BindGroupEntry<'_>> = uniforms
            .iter()
            .map(|u| wgpu::BindGroupEntry {
                binding: u.slot.location,
                resource: u.buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} bind group", desc.label)),
            layout: &bind_group_layout,
            entries: &group_entries,
        });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} pipeline layout", desc.label)),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: desc.vertex_buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs_module,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: desc.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: desc.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        if let Some(log) = ctx.errors.take_joined() {
            return Err(ShaderBuildError::link(log));
        }

        log::info!(
            "built shader program `{}` (id {})",
            desc.label,
            compiled.handle.program.get()
        );

        Ok(Self {
            handle: compiled.handle.clone(),
            uniforms,
            bind_group,
            pipeline,
        })
    }

    pub fn handle(&self) -> &ShaderHandle {
        &self.handle
    }

    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        self.handle.uniform_location(name)
    }

    /// Uploads `bytes` into the uniform at `location`.
    ///
    /// `bytes` must be exactly the size of the WGSL type.
    pub fn write_uniform(
        &self,
        queue: &wgpu::Queue,
        location: u32,
        bytes: &[u8],
    ) -> Result<(), RenderError> {
        let uniform = self
            .uniforms
            .iter()
            .find(|u| u.slot.location == location)
            .ok_or(RenderError::UnknownUniform(location))?;

        let actual = bytes.len() as u64;
        if actual != uniform.slot.size {
            return Err(RenderError::UniformSize {
                name: uniform.slot.name.clone(),
                expected: uniform.slot.size,
                actual,
            });
        }

        queue.write_buffer(&uniform.buffer, 0, bytes);
        Ok(())
    }

    /// Sets this program's pipeline and bind group on `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
    }
}

/// Uniform buffers are allocated in 16-byte steps.
fn uniform_buffer_size(size: u64) -> u64 {
    size.max(1).next_multiple_of(16)
}
