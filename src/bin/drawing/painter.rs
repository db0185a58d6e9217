use crossbeam_channel::{unbounded, TryRecvError};
use nalgebra_glm as glm;
use notify::{event::ModifyKind, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use wgpu::util::DeviceExt;
use wgpu::*;
use wgpu_glyph::{
    ab_glyph::FontArc, GlyphBrush, GlyphBrushBuilder, HorizontalAlign, Section, Text,
    VerticalAlign,
};
use winit::{event_loop::EventLoop, window::WindowBuilder};

use crate::app_state::AppState;
use crate::config::CONFIG;
use crate::drawing::helpers::{as_bytes, load_glsl, ShaderStage};
use crate::drawing::layout;

const RENDER_FORMAT: TextureFormat = TextureFormat::Bgra8Unorm;

#[repr(C)]
#[derive(Copy, Clone)]
struct Vertex {
    position: [f32; 2],
    color: [f32; 4],
}

/// One piece of overlay text queued for the glyph pass.
struct TextItem {
    content: String,
    position: (f32, f32),
    bounds: (f32, f32),
    color: [f32; 4],
    scale: f32,
    centered: bool,
}

pub struct Painter {
    pub window: winit::window::Window,
    hidpi_factor: f64,
    surface: Surface,
    pub device: Device,
    pub queue: Queue,
    swap_chain_descriptor: SwapChainDescriptor,
    swap_chain: SwapChain,
    pipeline_layout: PipelineLayout,
    pipeline: RenderPipeline,
    multisampled_framebuffer: TextureView,
    uniform_buffer: Buffer,
    bind_group: BindGroup,
    glyph_brush: GlyphBrush<()>,
    staging_belt: util::StagingBelt,
    rx: crossbeam_channel::Receiver<std::result::Result<notify::event::Event, notify::Error>>,
    _watcher: RecommendedWatcher,
}

impl Painter {
    /// Initializes the entire draw machinery.
    pub fn init(event_loop: &EventLoop<()>, width: u32, height: u32) -> Self {
        let window = WindowBuilder::new()
            .with_title("placemark")
            .with_inner_size(winit::dpi::LogicalSize::new(width as f64, height as f64))
            .build(event_loop)
            .expect("Unable to open a window.");
        let hidpi_factor = window.scale_factor();
        let size = window.inner_size();

        let instance = Instance::new(BackendBit::PRIMARY);
        let surface = unsafe { instance.create_surface(&window) };

        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::LowPower,
            compatible_surface: Some(&surface),
        }))
        .expect("Unable to find a suitable GPU adapter.");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &DeviceDescriptor {
                features: Features::empty(),
                limits: Limits::default(),
                shader_validation: true,
            },
            None,
        ))
        .expect("Unable to request a GPU device.");

        let (tx, rx) = unbounded();

        let mut watcher: RecommendedWatcher = match Watcher::new_immediate(tx) {
            Ok(watcher) => watcher,
            Err(err) => {
                log::info!("Failed to create a watcher for the shaders:");
                log::info!("{}", err);
                panic!("Unable to load a vertex shader.");
            }
        };

        match watcher.watch(&CONFIG.map.vertex_shader, RecursiveMode::Recursive) {
            Ok(_) => {}
            Err(err) => {
                log::info!("Failed to start watching {}:", &CONFIG.map.vertex_shader);
                log::info!("{}", err);
            }
        }

        match watcher.watch(&CONFIG.map.fragment_shader, RecursiveMode::Recursive) {
            Ok(_) => {}
            Err(err) => {
                log::info!("Failed to start watching {}:", &CONFIG.map.fragment_shader);
                log::info!("{}", err);
            }
        }

        let (vs_module, fs_module) = Self::load_shader(
            &device,
            &CONFIG.map.vertex_shader,
            &CONFIG.map.fragment_shader,
        )
        .expect("Fatal Error. Unable to load shaders.");

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: None,
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStage::VERTEX,
                ty: BindingType::UniformBuffer {
                    dynamic: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = Self::create_pipeline(&device, &pipeline_layout, &vs_module, &fs_module);

        let swap_chain_descriptor = SwapChainDescriptor {
            usage: TextureUsage::OUTPUT_ATTACHMENT,
            format: RENDER_FORMAT,
            width: size.width,
            height: size.height,
            present_mode: PresentMode::Mailbox,
        };
        let swap_chain = device.create_swap_chain(&surface, &swap_chain_descriptor);

        let multisampled_framebuffer = Self::create_multisampled_framebuffer(
            &device,
            &swap_chain_descriptor,
            CONFIG.map.msaa_samples,
        );

        let uniform_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: None,
            contents: as_bytes(Self::canvas_transform(size.width, size.height).as_slice()),
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::Buffer(uniform_buffer.slice(..)),
            }],
        });

        let font_data =
            std::fs::read(&CONFIG.general.ui_font).expect("Unable to read the UI font.");
        let font = FontArc::try_from_vec(font_data).expect("Unable to parse the UI font.");
        let glyph_brush = GlyphBrushBuilder::using_font(font).build(&device, RENDER_FORMAT);

        Self {
            window,
            hidpi_factor,
            surface,
            device,
            queue,
            swap_chain_descriptor,
            swap_chain,
            pipeline_layout,
            pipeline,
            multisampled_framebuffer,
            uniform_buffer,
            bind_group,
            glyph_brush,
            staging_belt: util::StagingBelt::new(1024),
            rx,
            _watcher: watcher,
        }
    }

    pub fn get_hidpi_factor(&self) -> f64 {
        self.hidpi_factor
    }

    /// Pixel coordinates to normalized device coordinates, y down.
    fn canvas_transform(width: u32, height: u32) -> glm::TMat4<f32> {
        glm::ortho(0.0, width as f32, height as f32, 0.0, -1.0, 1.0)
    }

    fn create_pipeline(
        device: &Device,
        pipeline_layout: &PipelineLayout,
        vs_module: &ShaderModule,
        fs_module: &ShaderModule,
    ) -> RenderPipeline {
        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: None,
            layout: Some(pipeline_layout),
            vertex_stage: ProgrammableStageDescriptor {
                module: vs_module,
                entry_point: "main",
            },
            fragment_stage: Some(ProgrammableStageDescriptor {
                module: fs_module,
                entry_point: "main",
            }),
            rasterization_state: Some(RasterizationStateDescriptor {
                front_face: FrontFace::Ccw,
                cull_mode: CullMode::None,
                ..Default::default()
            }),
            primitive_topology: PrimitiveTopology::TriangleList,
            color_states: &[ColorStateDescriptor {
                format: RENDER_FORMAT,
                color_blend: BlendDescriptor {
                    src_factor: BlendFactor::SrcAlpha,
                    dst_factor: BlendFactor::OneMinusSrcAlpha,
                    operation: BlendOperation::Add,
                },
                alpha_blend: BlendDescriptor {
                    src_factor: BlendFactor::One,
                    dst_factor: BlendFactor::OneMinusSrcAlpha,
                    operation: BlendOperation::Add,
                },
                write_mask: ColorWrite::ALL,
            }],
            depth_stencil_state: None,
            vertex_state: VertexStateDescriptor {
                index_format: IndexFormat::Uint16,
                vertex_buffers: &[VertexBufferDescriptor {
                    stride: std::mem::size_of::<Vertex>() as BufferAddress,
                    step_mode: InputStepMode::Vertex,
                    attributes: &[
                        VertexAttributeDescriptor {
                            format: VertexFormat::Float2,
                            offset: 0,
                            shader_location: 0,
                        },
                        VertexAttributeDescriptor {
                            format: VertexFormat::Float4,
                            offset: 8,
                            shader_location: 1,
                        },
                    ],
                }],
            },
            sample_count: CONFIG.map.msaa_samples,
            sample_mask: !0,
            alpha_to_coverage_enabled: false,
        })
    }

    fn create_multisampled_framebuffer(
        device: &Device,
        swap_chain_descriptor: &SwapChainDescriptor,
        sample_count: u32,
    ) -> TextureView {
        device
            .create_texture(&TextureDescriptor {
                label: None,
                size: Extent3d {
                    width: swap_chain_descriptor.width,
                    height: swap_chain_descriptor.height,
                    depth: 1,
                },
                mip_level_count: 1,
                sample_count,
                dimension: TextureDimension::D2,
                format: swap_chain_descriptor.format,
                usage: TextureUsage::OUTPUT_ATTACHMENT,
            })
            .create_view(&TextureViewDescriptor::default())
    }

    /// Loads a shader module from a GLSL vertex and fragment shader each.
    fn load_shader(
        device: &Device,
        vertex_shader: &str,
        fragment_shader: &str,
    ) -> Option<(ShaderModule, ShaderModule)> {
        let vs_source = match std::fs::read_to_string(vertex_shader) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Unable to read {}. Reason:\r\n{}", vertex_shader, e);
                return None;
            }
        };
        let fs_source = match std::fs::read_to_string(fragment_shader) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Unable to read {}. Reason:\r\n{}", fragment_shader, e);
                return None;
            }
        };

        let vs_module = device.create_shader_module(load_glsl(&vs_source, ShaderStage::Vertex)?);
        let fs_module = device.create_shader_module(load_glsl(&fs_source, ShaderStage::Fragment)?);
        Some((vs_module, fs_module))
    }

    /// Reloads the shaders if the file watcher detected any change.
    ///
    /// A failed reload keeps the previous pipeline.
    pub fn update_shader(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(Ok(notify::event::Event {
                kind: EventKind::Modify(ModifyKind::Data(_)),
                ..
            })) => {
                if let Some((vs_module, fs_module)) = Self::load_shader(
                    &self.device,
                    &CONFIG.map.vertex_shader,
                    &CONFIG.map.fragment_shader,
                ) {
                    self.pipeline = Self::create_pipeline(
                        &self.device,
                        &self.pipeline_layout,
                        &vs_module,
                        &fs_module,
                    );
                    true
                } else {
                    false
                }
            }
            // Everything is alright but the file wasn't actually changed.
            Ok(Ok(_)) => false,
            Ok(Err(err)) => {
                log::info!("Something went wrong with the shader file watcher:\r\n{:?}", err);
                false
            }
            // This happens all the time when there is no new message.
            Err(TryRecvError::Empty) => false,
            Err(err) => {
                log::info!("Something went wrong with the shader file watcher:\r\n{:?}", err);
                false
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.swap_chain_descriptor.width = width;
        self.swap_chain_descriptor.height = height;
        self.swap_chain = self
            .device
            .create_swap_chain(&self.surface, &self.swap_chain_descriptor);
        self.multisampled_framebuffer = Self::create_multisampled_framebuffer(
            &self.device,
            &self.swap_chain_descriptor,
            CONFIG.map.msaa_samples,
        );
    }

    pub fn paint(&mut self, app_state: &mut AppState) {
        let frame = match self.swap_chain.get_current_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Dropped a frame. Reason:\r\n{:?}", e);
                self.swap_chain = self
                    .device
                    .create_swap_chain(&self.surface, &self.swap_chain_descriptor);
                return;
            }
        };

        let width = self.swap_chain_descriptor.width;
        let height = self.swap_chain_descriptor.height;

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            as_bytes(Self::canvas_transform(width, height).as_slice()),
        );

        let (vertices, texts) = build_scene(app_state);

        let vertex_buffer = self.device.create_buffer_init(&util::BufferInitDescriptor {
            label: None,
            contents: as_bytes(&vertices),
            usage: BufferUsage::VERTEX,
        });

        let background = app_state
            .theme
            .color("map", "background-color", geoview::Color { r: 233, g: 229, b: 220, a: 1.0 })
            .components();

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: None });

        {
            let (attachment, resolve_target) = if CONFIG.map.msaa_samples > 1 {
                (&self.multisampled_framebuffer, Some(&frame.output.view))
            } else {
                (&frame.output.view, None)
            };

            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                color_attachments: &[RenderPassColorAttachmentDescriptor {
                    attachment,
                    resolve_target,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: background[0] as f64,
                            g: background[1] as f64,
                            b: background[2] as f64,
                            a: background[3] as f64,
                        }),
                        store: true,
                    },
                }],
                depth_stencil_attachment: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.draw(0..vertices.len() as u32, 0..1);
        }

        for text in &texts {
            let glyph_layout = if text.centered {
                wgpu_glyph::Layout::default_single_line()
                    .h_align(HorizontalAlign::Center)
                    .v_align(VerticalAlign::Center)
            } else {
                wgpu_glyph::Layout::default_wrap()
            };
            self.glyph_brush.queue(Section {
                screen_position: text.position,
                bounds: text.bounds,
                layout: glyph_layout,
                text: vec![Text::new(&text.content)
                    .with_color(text.color)
                    .with_scale(text.scale)],
            });
        }

        if let Err(e) = self.glyph_brush.draw_queued(
            &self.device,
            &mut self.staging_belt,
            &mut encoder,
            &frame.output.view,
            width,
            height,
        ) {
            log::error!("Unable to draw the overlay text. Reason:\r\n{}", e);
        }

        self.staging_belt.finish();
        self.queue.submit(Some(encoder.finish()));

        self.device.poll(Maintain::Wait);
        pollster::block_on(self.staging_belt.recall());
    }
}

/// Assembles the scene geometry and text for one frame.
fn build_scene(app_state: &AppState) -> (Vec<Vertex>, Vec<TextItem>) {
    let mut vertices = vec![];
    let mut texts = vec![];
    let theme = &app_state.theme;

    let marker_fill = theme
        .color("marker", "fill", geoview::Color { r: 124, g: 47, b: 66, a: 1.0 })
        .components();
    let marker_width = theme.number("marker", "width", 12.0);
    let marker_height = theme.number("marker", "height", 18.0);

    let cluster_fill = theme
        .color("cluster", "fill", geoview::Color { r: 124, g: 47, b: 66, a: 0.9 })
        .components();
    let cluster_width = theme.number("cluster", "width", 48.0);
    let cluster_height = theme.number("cluster", "height", 48.0);
    let cluster_text_color = theme
        .color("cluster", "text-color", geoview::Color { r: 241, g: 241, b: 243, a: 1.0 })
        .components();
    let cluster_text_size = theme.number("cluster", "text-size", 18.0);

    for cluster in app_state.clusters() {
        let center = app_state.screen.world_to_screen(app_state.zoom, &cluster.center);

        if cluster.count() > 1 {
            push_quad(
                &mut vertices,
                center.x - cluster_width / 2.0,
                center.y - cluster_height / 2.0,
                cluster_width,
                cluster_height,
                cluster_fill,
            );
            texts.push(TextItem {
                content: cluster.count().to_string(),
                position: (center.x, center.y),
                bounds: (cluster_width, cluster_height),
                color: cluster_text_color,
                scale: cluster_text_size,
                centered: true,
            });
        } else {
            // A pin: a body with a tip pointing at the position.
            let top = center.y - marker_height / 2.0;
            let body_height = marker_height * 2.0 / 3.0;
            push_quad(
                &mut vertices,
                center.x - marker_width / 2.0,
                top,
                marker_width,
                body_height,
                marker_fill,
            );
            push_triangle(
                &mut vertices,
                [center.x - marker_width / 2.0, top + body_height],
                [center.x + marker_width / 2.0, top + body_height],
                [center.x, center.y + marker_height / 2.0],
                marker_fill,
            );
        }
    }

    if app_state.popup.is_open() {
        let popup_fill = theme
            .color("popup", "background-color", geoview::Color::WHITE)
            .components();
        let popup_text_color = theme
            .color("popup", "text-color", geoview::Color::BLACK)
            .components();
        let popup_text_size = theme.number("popup", "text-size", 14.0);

        let anchor = app_state
            .screen
            .world_to_screen(app_state.zoom, &app_state.popup.anchor());
        let x = anchor.x - layout::POPUP_WIDTH / 2.0;
        let y = anchor.y - layout::POPUP_HEIGHT - layout::POPUP_OFFSET;

        push_quad(
            &mut vertices,
            x,
            y,
            layout::POPUP_WIDTH,
            layout::POPUP_HEIGHT,
            popup_fill,
        );
        push_triangle(
            &mut vertices,
            [anchor.x - 6.0, y + layout::POPUP_HEIGHT],
            [anchor.x + 6.0, y + layout::POPUP_HEIGHT],
            [anchor.x, anchor.y],
            popup_fill,
        );
        texts.push(TextItem {
            content: app_state.popup.content().to_string(),
            position: (x + 8.0, y + 8.0),
            bounds: (layout::POPUP_WIDTH - 16.0, layout::POPUP_HEIGHT - 16.0),
            color: popup_text_color,
            scale: popup_text_size,
            centered: false,
        });
    }

    let box_fill = theme
        .color("searchbox", "background-color", geoview::Color::WHITE)
        .components();
    let box_text_color = theme
        .color("searchbox", "text-color", geoview::Color::BLACK)
        .components();
    let box_text_size = theme.number("searchbox", "text-size", 14.0);
    let highlight_fill = theme
        .color("searchbox", "highlight-color", geoview::Color { r: 220, g: 230, b: 240, a: 1.0 })
        .components();

    push_quad(
        &mut vertices,
        layout::SEARCH_X,
        layout::SEARCH_Y,
        layout::SEARCH_WIDTH,
        layout::SEARCH_HEIGHT,
        box_fill,
    );
    texts.push(TextItem {
        content: app_state.autocomplete.value().to_string(),
        position: (layout::SEARCH_X + 8.0, layout::SEARCH_Y + 6.0),
        bounds: (layout::SEARCH_WIDTH - 16.0, layout::SEARCH_HEIGHT),
        color: box_text_color,
        scale: box_text_size,
        centered: false,
    });

    if app_state.autocomplete.is_open() {
        for (i, suggestion) in app_state.autocomplete.suggestions().iter().enumerate() {
            let y = layout::SEARCH_Y + layout::SEARCH_HEIGHT + i as f32 * layout::SUGGESTION_HEIGHT;
            let fill = if app_state.autocomplete.highlighted() == Some(i) {
                highlight_fill
            } else {
                box_fill
            };
            push_quad(
                &mut vertices,
                layout::SEARCH_X,
                y,
                layout::SEARCH_WIDTH,
                layout::SUGGESTION_HEIGHT,
                fill,
            );
            texts.push(TextItem {
                content: suggestion.label.clone(),
                position: (layout::SEARCH_X + 8.0, y + 4.0),
                bounds: (layout::SEARCH_WIDTH - 16.0, layout::SUGGESTION_HEIGHT),
                color: box_text_color,
                scale: box_text_size,
                centered: false,
            });
        }
    }

    (vertices, texts)
}

fn push_quad(vertices: &mut Vec<Vertex>, x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) {
    let (x2, y2) = (x + width, y + height);
    vertices.push(Vertex { position: [x, y], color });
    vertices.push(Vertex { position: [x2, y], color });
    vertices.push(Vertex { position: [x, y2], color });
    vertices.push(Vertex { position: [x2, y], color });
    vertices.push(Vertex { position: [x2, y2], color });
    vertices.push(Vertex { position: [x, y2], color });
}

fn push_triangle(vertices: &mut Vec<Vertex>, a: [f32; 2], b: [f32; 2], c: [f32; 2], color: [f32; 4]) {
    vertices.push(Vertex { position: a, color });
    vertices.push(Vertex { position: b, color });
    vertices.push(Vertex { position: c, color });
}
