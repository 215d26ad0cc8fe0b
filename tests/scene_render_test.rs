//! End-to-end frames against a headless device. Every test skips cleanly
//! when the machine has no usable GPU adapter.

use lumen_ngin::{
    math::Matrix4, math::Vector3, Background, Camera, Color, CubeTextureLoader, Geometry,
    GpuContext, InstancedMesh, Material, Mesh, Renderer, Scene, SceneObject, Side,
    Texture2dLoader,
};

fn gpu() -> Option<GpuContext> {
    match pollster::block_on(GpuContext::headless(64, 64)) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn offscreen_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen target"),
        size: wgpu::Extent3d {
            width: gpu.config.width,
            height: gpu.config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: gpu.config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn readback_target(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("readback target"),
        size: wgpu::Extent3d {
            width: gpu.config.width,
            height: gpu.config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: gpu.config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Copies the render target out and returns the RGBA bytes of its center
/// pixel. The 64-pixel width keeps bytes_per_row at the 256-byte alignment
/// the copy requires.
fn center_pixel(gpu: &GpuContext, texture: &wgpu::Texture) -> [u8; 4] {
    let (width, height) = (gpu.config.width, gpu.config.height);
    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback buffer"),
        size: u64::from(width * height * 4),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    gpu.device.poll(wgpu::PollType::Wait).unwrap();
    rx.recv().unwrap().unwrap();

    let data = slice.get_mapped_range();
    let offset = ((height / 2) * width + width / 2) as usize * 4;
    [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
}

fn test_camera() -> Camera {
    let mut camera = Camera::new(45.0, 1.0, 0.1, 500.0).unwrap();
    camera.position = Vector3::new(0.0, 0.0, 10.0);
    camera.look_at(Vector3::ZERO);
    camera
}

fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[test]
fn one_solid_cuboid_is_one_draw_call_of_36_vertices() {
    let Some(gpu) = gpu() else { return };
    let camera = test_camera();
    let mut renderer = pollster::block_on(Renderer::new(&gpu, &camera)).unwrap();

    let mut scene = Scene::new();
    let mesh = Mesh::new(
        Geometry::cuboid(1.0, 1.0, 1.0),
        Material::solid(Color::hex(0xff00ff)),
    );
    scene
        .add(Box::new(mesh), &gpu.device, &gpu.queue, &renderer.pipelines)
        .unwrap();

    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let view = offscreen_view(&gpu);
    let report = renderer.render_to_view(&gpu, &scene, &view).unwrap();

    assert_eq!(report.draw_calls, 1);
    assert_eq!(report.vertices, 36);
    assert_eq!(report.instances, 1);
    assert!(!report.background_drawn);
}

#[test]
fn default_side_shows_the_outward_faces() {
    let Some(gpu) = gpu() else { return };
    let camera = test_camera();
    let mut renderer = pollster::block_on(Renderer::new(&gpu, &camera)).unwrap();

    // Face 0 is the +Z wall the camera looks at, face 1 the far -Z wall.
    let palette = vec![Color::new(1.0, 0.0, 0.0), Color::new(0.0, 1.0, 0.0)];
    let mesh = Mesh::new(
        Geometry::cuboid(1.0, 1.0, 1.0),
        Material::face_colors(palette.clone()),
    );

    let mut scene = Scene::new();
    scene
        .add(Box::new(mesh), &gpu.device, &gpu.queue, &renderer.pipelines)
        .unwrap();

    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let (texture, view) = readback_target(&gpu);
    renderer.render_to_view(&gpu, &scene, &view).unwrap();
    assert_eq!(
        center_pixel(&gpu, &texture),
        [255, 0, 0, 255],
        "front side must show the near outward face"
    );

    // Side::Back keeps only the interior faces: looking through the near
    // wall, the far wall's inside is what the camera hits.
    let mut inverted = Mesh::new(
        Geometry::cuboid(1.0, 1.0, 1.0),
        Material::face_colors(palette),
    );
    inverted.side = Side::Back;
    let mut scene = Scene::new();
    scene
        .add(
            Box::new(inverted),
            &gpu.device,
            &gpu.queue,
            &renderer.pipelines,
        )
        .unwrap();

    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let (texture, view) = readback_target(&gpu);
    renderer.render_to_view(&gpu, &scene, &view).unwrap();
    assert_eq!(
        center_pixel(&gpu, &texture),
        [0, 255, 0, 255],
        "back side must show the far interior face"
    );
}

#[test]
fn instanced_mesh_draws_count_instances_in_one_call() {
    let Some(gpu) = gpu() else { return };
    let camera = test_camera();
    let mut renderer = pollster::block_on(Renderer::new(&gpu, &camera)).unwrap();

    let mut instanced = InstancedMesh::new(
        Geometry::cuboid(0.5, 0.5, 0.5),
        Material::solid(Color::WHITE),
        2,
    );
    instanced.set_matrix_at(0, Matrix4::from_translation(Vector3::new(0.0, 0.0, -2.0)));
    instanced.set_matrix_at(1, Matrix4::from_translation(Vector3::new(0.0, 0.0, -4.0)));
    instanced.set_color_at(0, [1.0, 0.0, 0.0]);
    instanced.set_color_at(1, [0.0, 0.0, 1.0]);
    // Out-of-range writes must not grow the arrays.
    instanced.set_color_at(2, [0.0, 1.0, 0.0]);
    assert_eq!(instanced.count(), 2);
    assert!(instanced.color_at(2).is_none());

    // The instanced pipeline has no texture group, so updating must build
    // the vertex streams without a bind group.
    instanced
        .update(&gpu.device, &gpu.queue, &renderer.pipelines)
        .unwrap();
    assert!(instanced.material.color_buffer().is_some());
    assert!(instanced.material.bind_group().is_none());

    let mut scene = Scene::new();
    scene
        .add(
            Box::new(instanced),
            &gpu.device,
            &gpu.queue,
            &renderer.pipelines,
        )
        .unwrap();

    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let view = offscreen_view(&gpu);
    let report = renderer.render_to_view(&gpu, &scene, &view).unwrap();

    assert_eq!(report.draw_calls, 1);
    assert_eq!(report.instances, 2);
}

#[test]
fn scene_add_remove_round_trips() {
    let Some(gpu) = gpu() else { return };
    let camera = test_camera();
    let renderer = pollster::block_on(Renderer::new(&gpu, &camera)).unwrap();

    let mut scene = Scene::new();
    assert!(scene.is_empty());

    let a = scene
        .add(
            Box::new(Mesh::new(
                Geometry::cuboid(1.0, 1.0, 1.0),
                Material::solid(Color::WHITE),
            )),
            &gpu.device,
            &gpu.queue,
            &renderer.pipelines,
        )
        .unwrap();
    let b = scene
        .add(
            Box::new(Mesh::new(
                Geometry::plane(1.0, 1.0),
                Material::solid(Color::BLACK),
            )),
            &gpu.device,
            &gpu.queue,
            &renderer.pipelines,
        )
        .unwrap();
    assert_eq!(scene.len(), 2);

    // Removal detaches without disposing; the object comes back out.
    let mut removed = scene.remove(a).expect("member removed");
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.objects()[0].uuid(), b);

    // Removing a non-member is a no-op.
    assert!(scene.remove(a).is_none());
    assert_eq!(scene.len(), 1);

    // The detached object still owns GPU resources until disposed.
    assert!(removed.dispose());
    assert!(!removed.dispose());

    scene.dispose_all();
}

#[test]
fn pending_texture_renders_with_placeholder_then_swaps() {
    let Some(gpu) = gpu() else { return };
    let camera = test_camera();
    let mut renderer = pollster::block_on(Renderer::new(&gpu, &camera)).unwrap();

    let loader = Texture2dLoader::new();
    let mut scene = Scene::new();
    scene
        .add(
            Box::new(Mesh::new(
                Geometry::cuboid(1.0, 1.0, 1.0),
                Material::texture(loader.clone()),
            )),
            &gpu.device,
            &gpu.queue,
            &renderer.pipelines,
        )
        .unwrap();

    // Frame one: load pending, the placeholder still produces a draw.
    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let view = offscreen_view(&gpu);
    let report = renderer.render_to_view(&gpu, &scene, &view).unwrap();
    assert_eq!(report.draw_calls, 1);

    // Bytes arrive between frames; frame two picks the texture up.
    loader.decode(&png_bytes([0, 255, 0, 255]), "late").unwrap();
    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let report = renderer.render_to_view(&gpu, &scene, &view).unwrap();
    assert_eq!(report.draw_calls, 1);
}

#[test]
fn background_waits_for_its_cube_texture() {
    let Some(gpu) = gpu() else { return };
    let camera = test_camera();
    let mut renderer = pollster::block_on(Renderer::new(&gpu, &camera)).unwrap();

    let loader = CubeTextureLoader::new();
    let mut scene = Scene::new();
    scene.set_background(Background::new(loader.clone()));

    // Pending cube texture: no skybox in the frame.
    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let view = offscreen_view(&gpu);
    let report = renderer.render_to_view(&gpu, &scene, &view).unwrap();
    assert!(!report.background_drawn);
    assert_eq!(report.draw_calls, 0);

    // All six faces resolve; the next frame draws the skybox first.
    let face = png_bytes([40, 40, 80, 255]);
    let faces: [&[u8]; 6] = [&face, &face, &face, &face, &face, &face];
    loader.decode_faces(&faces, "sky").unwrap();

    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let report = renderer.render_to_view(&gpu, &scene, &view).unwrap();
    assert!(report.background_drawn);
    assert_eq!(report.draw_calls, 1);
    assert_eq!(report.vertices, 36);
}

#[test]
fn cube_textured_mesh_renders() {
    let Some(gpu) = gpu() else { return };
    let camera = test_camera();
    let mut renderer = pollster::block_on(Renderer::new(&gpu, &camera)).unwrap();

    let loader = CubeTextureLoader::new();
    let face = png_bytes([200, 100, 0, 255]);
    let faces: [&[u8]; 6] = [&face, &face, &face, &face, &face, &face];
    loader.decode_faces(&faces, "cube").unwrap();

    let mut scene = Scene::new();
    scene
        .add(
            Box::new(Mesh::new(
                Geometry::cuboid(1.0, 1.0, 1.0),
                Material::cube_texture(loader),
            )),
            &gpu.device,
            &gpu.queue,
            &renderer.pipelines,
        )
        .unwrap();

    renderer.prepare(&gpu, &mut scene, &camera).unwrap();
    let view = offscreen_view(&gpu);
    let report = renderer.render_to_view(&gpu, &scene, &view).unwrap();
    assert_eq!(report.draw_calls, 1);
    assert_eq!(report.vertices, 36);
}
