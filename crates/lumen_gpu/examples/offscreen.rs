//! Offscreen rendering demo: draws a small scene into a texture and reports
//! the frame stats. Run with `RUST_LOG=debug` for renderer tracing.

use lumen_gpu::renderer::{Renderer, RendererConfig};
use lumen_paint::{Color, CornerRadii, FillStyle, Gradient, Point};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut renderer = Renderer::new_blocking(RendererConfig::default())?;
    let target = renderer.create_target(800, 600);
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    renderer.begin_frame(800.0, 600.0, 1.0);

    renderer.drop_shadow(
        100.0,
        100.0,
        200.0,
        120.0,
        12.0,
        2.0,
        Color::BLACK.with_alpha(0.35),
        CornerRadii::uniform(10.0),
    );
    renderer.rect(
        100.0,
        100.0,
        200.0,
        120.0,
        &FillStyle::Gradient(Gradient::linear(
            Point::new(0.0, 0.0),
            Point::new(0.0, 120.0),
            Color::from_hex(0x4f8fef),
            Color::from_hex(0x2b5fb8),
        )),
        CornerRadii::uniform(10.0),
    );
    renderer.hollow_rect(
        100.0,
        100.0,
        200.0,
        120.0,
        2.0,
        Color::WHITE.with_alpha(0.6),
        CornerRadii::uniform(10.0),
    );

    renderer.push_scissor(320.0, 100.0, 120.0, 120.0);
    renderer.rect(
        300.0,
        80.0,
        200.0,
        200.0,
        &FillStyle::Color(Color::from_hex(0xe06040)),
        CornerRadii::ZERO,
    );
    renderer.pop_scissor();

    if let Ok(font) = renderer.register_default_font() {
        renderer.text(font, 100.0, 260.0, "Hello, Lumen", Color::BLACK, 24.0)?;
        let (w, h) = renderer.text_bounds(font, "Hello, Lumen", 24.0)?;
        println!("text bounds: {:.1} x {:.1}", w, h);
    } else {
        println!("no system font available, skipping text");
    }

    renderer.end_frame(&view, Color::from_hex(0xf4f4f0))?;
    println!("frame rendered offscreen at 800x600");

    renderer.cleanup();
    Ok(())
}
