use pngcore::{png::*, *};

const USAGE: &str = "\
usage:
  pngcore info <file>
  pngcore chunks <file>
  pngcore recode <in> <out> [--indexed] [--level N]";

fn main() {
  let args: Vec<String> = std::env::args().skip(1).collect();
  let args: Vec<&str> = args.iter().map(String::as_str).collect();
  let result = match args.as_slice() {
    ["info", path] => info(path),
    ["chunks", path] => chunks(path),
    ["recode", input, output, flags @ ..] => match parse_recode_flags(flags) {
      Some(options) => recode(input, output, &options),
      None => usage(),
    },
    _ => usage(),
  };
  if let Err(e) = result {
    eprintln!("error: {e}");
    std::process::exit(1);
  }
}

fn usage() -> PngResult<()> {
  eprintln!("{USAGE}");
  std::process::exit(2);
}

fn parse_recode_flags(mut flags: &[&str]) -> Option<EncoderOptions> {
  let mut options = EncoderOptions::default();
  loop {
    flags = match flags {
      [] => return Some(options),
      ["--indexed", rest @ ..] => {
        options = options.set_indexed(true);
        rest
      }
      ["--level", n, rest @ ..] => {
        options = options.set_level(CompressionLevel::new(n.parse().ok()?));
        rest
      }
      _ => return None,
    };
  }
}

fn info(path: &str) -> PngResult<()> {
  let info = peek_info_file(path)?;
  println!("{path}: {}x{}", info.width, info.height);
  println!("  bit depth: {}", info.bit_depth);
  println!("  color type: {}", info.color_type);
  if info.colormap_entries > 0 {
    println!("  palette entries: {}", info.colormap_entries);
  }
  Ok(())
}

fn chunks(path: &str) -> PngResult<()> {
  let bytes = std::fs::read(path)?;
  for chunk in PngChunkIter::from_png_bytes(&bytes)? {
    let chunk = chunk?;
    let status = if chunk.check_crc().is_ok() { "ok" } else { "BAD CRC" };
    println!("{} {:>10} {:08X} {status}", chunk.ty(), chunk.data().len(), chunk.declared_crc());
  }
  Ok(())
}

fn recode(input: &str, output: &str, options: &EncoderOptions) -> PngResult<()> {
  let image = decode_file(input)?;
  let before = std::fs::metadata(input)?.len();
  encode_file_with(output, &image, options)?;
  let after = std::fs::metadata(output)?.len();
  println!("{input} ({before} bytes) -> {output} ({after} bytes)");
  Ok(())
}
