//! The application shell: window, frame loop, and lifecycle hooks.

use std::sync::Arc;

use std::time::Duration;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    camera::Camera,
    context::GpuContext,
    error::{EngineError, EngineResult},
    renderer::{FrameReport, Renderer},
    scene::Scene,
};

/// Application callbacks driven by the frame loop.
///
/// `on_load` runs once after the GPU context, renderer, scene and camera
/// exist; build your scene there. `on_update` runs before every frame.
/// `on_error` observes a fatal frame error after the loop has paused.
pub trait EngineHook {
    fn on_load(&mut self, engine: &mut EngineState) -> anyhow::Result<()>;

    fn on_update(&mut self, engine: &mut EngineState, dt: Duration) -> anyhow::Result<()>;

    fn on_error(&mut self, _error: &anyhow::Error) {}
}

/// Everything the hooks get to touch.
pub struct EngineState {
    window: Arc<Window>,
    pub gpu: GpuContext,
    pub renderer: Renderer,
    pub scene: Scene,
    pub camera: Camera,
}

impl EngineState {
    async fn new(window: Arc<Window>) -> EngineResult<Self> {
        let gpu = GpuContext::new(window.clone()).await?;
        let camera = Camera::new(45.0, gpu.aspect(), 0.1, 500.0)?;
        let renderer = Renderer::new(&gpu, &camera).await?;
        Ok(Self {
            window,
            gpu,
            renderer,
            scene: Scene::new(),
            camera,
        })
    }

    /// Reconfigures the surface, depth buffer, and camera aspect. A
    /// degenerate aspect keeps the previous projection (already logged).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.renderer.resize(&self.gpu.device, width, height);
        let _ = self.camera.set_aspect(self.gpu.aspect());
    }

    pub fn render_frame(&mut self) -> EngineResult<FrameReport> {
        self.renderer.render(&self.gpu, &mut self.scene, &self.camera)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

enum EngineEvent {
    #[allow(dead_code)]
    Initialized(Box<EngineState>),
}

struct App<H: EngineHook> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<EngineEvent>,
    hook: H,
    state: Option<EngineState>,
    /// Set after a fatal frame error; the loop stops redrawing.
    paused: bool,
    last_time: Instant,
}

impl<H: EngineHook> App<H> {
    fn new(event_loop: &EventLoop<EngineEvent>, hook: H) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            hook,
            state: None,
            paused: false,
            last_time: Instant::now(),
        }
    }

    fn load(&mut self, mut state: EngineState) {
        if let Err(error) = self.hook.on_load(&mut state) {
            log::error!("load hook failed: {error:#}");
            self.hook.on_error(&error);
            self.paused = true;
        }
        state.window.request_redraw();
        self.state = Some(state);
        self.last_time = Instant::now();
    }
}

impl<H: EngineHook> ApplicationHandler<EngineEvent> for App<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::{JsCast, UnwrapThrowExt};
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let init_future = EngineState::new(window);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(state) => self.load(state),
                Err(error) => {
                    log::error!("engine initialization failed: {error}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::UnwrapThrowExt;

            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = init_future.await.expect_throw("engine initialization failed");
                assert!(proxy
                    .send_event(EngineEvent::Initialized(Box::new(state)))
                    .is_ok());
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: EngineEvent) {
        match event {
            EngineEvent::Initialized(state) => {
                // Sent by the wasm `spawn_local`; sync the surface to the
                // real canvas size before the first frame.
                let mut state = *state;
                let size = state.window.inner_size();
                state.resize(size.width, size.height);
                self.load(state);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                state.scene.dispose_all();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if self.paused {
                    return;
                }
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                if let Err(error) = self.hook.on_update(state, dt) {
                    log::error!("update hook failed, pausing: {error:#}");
                    self.hook.on_error(&error);
                    self.paused = true;
                    return;
                }

                match state.render_frame() {
                    Ok(_) => {
                        state.window.request_redraw();
                    }
                    Err(EngineError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let size = state.window.inner_size();
                        state.resize(size.width, size.height);
                        state.window.request_redraw();
                    }
                    Err(error) => {
                        log::error!("frame failed, pausing: {error}");
                        self.hook.on_error(&anyhow::Error::new(error));
                        self.paused = true;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Builds the window and event loop and runs `hook` until the window
/// closes or a fatal error pauses the engine.
pub fn run(hook: impl EngineHook + 'static) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::UnwrapThrowExt;
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<EngineEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, hook);
    event_loop.run_app(&mut app)?;

    Ok(())
}
