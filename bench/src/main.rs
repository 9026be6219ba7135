use std::cmp::Ordering;
use std::hint::black_box;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use bytemuck::cast_slice;
use log::{debug, info, warn};
use qoi::{Decoder, Encoder};
use structopt::StructOpt;

fn timeit<T>(mut func: impl FnMut() -> T) -> (T, Duration) {
    let t0 = Instant::now();
    let out = func();
    let t1 = Instant::now();
    (black_box(out), t1 - t0)
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

fn average_sec(tm: &[Duration], use_median: bool) -> f64 {
    let mut sec: Vec<f64> = tm.iter().map(Duration::as_secs_f64).collect();
    sec.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    if use_median {
        sec[sec.len() / 2]
    } else {
        mean(&sec)
    }
}

fn gray_to_rgba(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() * 4);
    for &px in buf {
        out.extend([px, px, px, 0xff]);
    }
    out
}

fn gray_alpha_to_rgba(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() * 2);
    for &[v, a] in cast_slice::<_, [u8; 2]>(buf) {
        out.extend([v, v, v, a]);
    }
    out
}

fn rgb_to_rgba(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() / 3 * 4);
    for &[r, g, b] in cast_slice::<_, [u8; 3]>(buf) {
        out.extend([r, g, b, 0xff]);
    }
    out
}

/// Source image, always expanded to 8-bit RGBA.
struct Image {
    pub width: u32,
    pub height: u32,
    pub png_channels: u8,
    pub data: Vec<u8>,
}

impl Image {
    fn read_png(filename: &Path) -> Result<Self> {
        let mut decoder = png::Decoder::new(BufReader::new(File::open(filename)?));
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info()?;
        let mut whole_buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut whole_buf)?;
        let buf = &whole_buf[..info.buffer_size()];
        ensure!(info.bit_depth == png::BitDepth::Eight, "invalid bit depth: {:?}", info.bit_depth);
        let data = match info.color_type {
            png::ColorType::Grayscale => gray_to_rgba(buf),
            png::ColorType::GrayscaleAlpha => gray_alpha_to_rgba(buf),
            png::ColorType::Rgb => rgb_to_rgba(buf),
            png::ColorType::Rgba => buf.to_vec(),
            color_type => anyhow::bail!("unsupported color type: {:?}", color_type),
        };
        let png_channels = info.color_type.samples() as u8;
        Ok(Self { width: info.width, height: info.height, png_channels, data })
    }

    fn write_png(filename: &Path, width: u32, height: u32, data: &[u8]) -> Result<()> {
        let writer = BufWriter::new(File::create(filename)?);
        let mut encoder = png::Encoder::new(writer, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(data)?;
        Ok(())
    }

    pub const fn n_pixels(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub const fn n_bytes(&self) -> usize {
        self.n_pixels() * 4
    }
}

/// Only an RGB source is recorded as 3 channels; gray sources are stored as RGBA.
const fn header_channels(png_channels: u8) -> qoi::Channels {
    if png_channels == 3 {
        qoi::Channels::Rgb
    } else {
        qoi::Channels::Rgba
    }
}

fn encode_file(img: &Image, output: &Path) -> Result<usize> {
    let encoder = Encoder::new(&img.data, img.width, img.height)?
        .with_channels(header_channels(img.png_channels));
    let mut writer = BufWriter::new(File::create(output)?);
    Ok(encoder.encode_to_stream(&mut writer)?)
}

fn decode_file(input: &Path) -> Result<(qoi::Header, Vec<u8>)> {
    let mut decoder = Decoder::from_stream(BufReader::new(File::open(input)?))?;
    let data = decoder.decode_to_vec()?;
    for warning in decoder.warnings() {
        warn!("{}: {}", input.display(), warning);
    }
    Ok((*decoder.header(), data))
}

#[derive(Debug, StructOpt)]
struct Args {
    /// PNG image to encode.
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// Where to write the encoded QOI image.
    #[structopt(parse(from_os_str))]
    output: PathBuf,
    /// Where to write the decoded image back as PNG.
    #[structopt(parse(from_os_str))]
    decoded: Option<PathBuf>,
    /// Number of timed encode/decode runs.
    #[structopt(short, long, default_value = "1")]
    runs: usize,
    /// Use average (mean) instead of the median.
    #[structopt(short, long)]
    average: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = <Args as StructOpt>::from_args();
    ensure!(args.runs > 0, "number of runs must be positive");

    let f = args.input.to_string_lossy();
    let img = Image::read_png(&args.input).context(format!("error reading PNG file: {}", f))?;
    info!(
        "loaded PNG '{}': {}x{}, {} channels (loaded as RGBA)",
        f, img.width, img.height, img.png_channels
    );

    let mut encode_tm = Vec::with_capacity(args.runs);
    for _ in 0..args.runs {
        let (res, t) = timeit(|| encode_file(&img, &args.output));
        res.context(format!("error encoding to: {}", args.output.display()))?;
        encode_tm.push(t);
    }
    let encode_sec = average_sec(&encode_tm, !args.average);
    info!("encoded '{}' in {:.4} s", args.output.display(), encode_sec);

    let mut decode_tm = Vec::with_capacity(args.runs);
    let mut decoded = None;
    for _ in 0..args.runs {
        let (res, t) = timeit(|| decode_file(&args.output));
        decoded = Some(res.context(format!("error decoding: {}", args.output.display()))?);
        decode_tm.push(t);
    }
    let decode_sec = average_sec(&decode_tm, !args.average);
    let (header, data) = decoded.context("no decode runs")?;
    info!(
        "decoded in {:.4} s: {}x{}, header channels {}, colorspace {}",
        decode_sec,
        header.width,
        header.height,
        header.channels.as_u8(),
        header.colorspace.as_u8()
    );

    ensure!(
        (header.width, header.height) == (img.width, img.height),
        "decoded dimensions ({}x{}) do not match original ({}x{})",
        header.width,
        header.height,
        img.width,
        img.height
    );
    ensure!(data == img.data, "decoded data doesn't roundtrip");
    debug!("roundtrip verified for {} pixels", img.n_pixels());

    if let Some(decoded_png) = &args.decoded {
        Image::write_png(decoded_png, header.width, header.height, &data)
            .context(format!("error writing decoded PNG: {}", decoded_png.display()))?;
        info!("decoded image saved to '{}'", decoded_png.display());
    }

    let size_raw = img.n_bytes() as f64;
    let size_qoi = fs::metadata(&args.output)?.len() as f64;
    let size_png = fs::metadata(&args.input)?.len() as f64;
    let n_pixels = img.n_pixels() as f64;
    println!("--- Benchmark Statistics ---");
    println!("{:<32}{:>12.0} bytes", "raw RGBA size:", size_raw);
    println!("{:<32}{:>12.0} bytes", "QOI size:", size_qoi);
    println!("{:<32}{:>12.2} : 1", "compression (raw / QOI):", size_raw / size_qoi);
    println!("{:<32}{:>12.2} : 1", "compression (PNG / QOI):", size_png / size_qoi);
    println!("{:<32}{:>12.2}", "QOI bits per pixel:", size_qoi * 8. / n_pixels);
    println!("{:<32}{:>12.2}", "raw RGBA bits per pixel:", size_raw * 8. / n_pixels);
    println!("{:<32}{:>12.2} Mp/s", "encode speed:", n_pixels / encode_sec / 1e6);
    println!("{:<32}{:>12.2} Mp/s", "decode speed:", n_pixels / decode_sec / 1e6);
    Ok(())
}
