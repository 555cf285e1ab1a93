//! image-plus - load an image surface headlessly and watch it play

use anyhow::{bail, Context, Result};
use image_plus::{HeadlessHost, HttpFetcher, ImagePlus, ImagePlusConfig, LifecycleEvent, MediaFetcher};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Render pass interval of the emulated host (~60 Hz)
const TICK_INTERVAL: Duration = Duration::from_millis(16);

const DEFAULT_RUN_SECONDS: u64 = 5;

struct Args {
    config: ImagePlusConfig,
    run_for: Duration,
}

fn usage() -> String {
    "usage: image-plus <src> [--seconds N]\n       image-plus --config <file.json> [--seconds N]".to_string()
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut config = None;
    let mut run_for = Duration::from_secs(DEFAULT_RUN_SECONDS);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a file")?;
                config = Some(ImagePlusConfig::load(&path)?);
            }
            "--seconds" => {
                let seconds: u64 = args
                    .next()
                    .context("--seconds needs a value")?
                    .parse()
                    .context("--seconds must be a whole number")?;
                run_for = Duration::from_secs(seconds);
            }
            "-h" | "--help" => bail!(usage()),
            src if config.is_none() => config = Some(ImagePlusConfig::new(src)),
            other => bail!("unexpected argument '{}'\n{}", other, usage()),
        }
    }

    let config = config.with_context(usage)?;
    config.validate()?;
    Ok(Args { config, run_for })
}

/// A real renderer reports the static image's size once it has loaded it.
/// Emulate that by decoding the image ourselves.
fn emulate_static_texture_load(image: &mut ImagePlus<HeadlessHost>, fetcher: &dyn MediaFetcher) {
    let Some(url) = image.host().material_source.clone() else {
        return;
    };

    match fetcher
        .fetch_bytes(&url)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| image::load_from_memory(&bytes).map_err(anyhow::Error::from))
    {
        Ok(decoded) => image.handle_event(LifecycleEvent::MaterialTextureLoaded {
            width: Some(decoded.width()),
            height: Some(decoded.height()),
        }),
        Err(e) => log::warn!("Could not load static image {}: {}", url, e),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;
    let fetcher = Arc::new(HttpFetcher::new(args.config.media_endpoint.clone()));
    let mut image = ImagePlus::new(args.config, HeadlessHost::default(), fetcher.clone());

    smol::block_on(image.update())?;
    emulate_static_texture_load(&mut image, fetcher.as_ref());

    let deadline = Instant::now() + args.run_for;
    let mut uploads = 0usize;

    while Instant::now() < deadline {
        image.tick(Instant::now());

        if let Some(texture) = image.texture_mut() {
            if texture.needs_update() {
                uploads += 1;
                log::debug!(
                    "Frame {}/{}",
                    texture.current_frame().map_or(0, |f| f + 1),
                    texture.frame_count()
                );
                texture.mark_uploaded();
            }
        }

        thread::sleep(TICK_INTERVAL);
    }

    let host = image.host();
    println!("geometry: {:?}", host.geometry);
    if let Some(half_extents) = host.half_extents {
        println!("shape half extents: {}", half_extents);
    }
    if let Some(source) = &host.material_source {
        println!("static source: {}", source);
    }
    match image.texture() {
        Some(texture) => println!("animated: {} frames, {} uploads", texture.frame_count(), uploads),
        None if image.is_loading() => println!("animated: still decoding"),
        None => {}
    }

    Ok(())
}
