//! Fake ffprobe/ffmpeg scripts for unit tests.
//!
//! Test "videos" are plain files whose first bytes read `VIDEO <duration>`.
//! Anything else is rejected by the fake prober like a corrupt container.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Prober understanding both `-show_format` and stream-check invocations
pub const FAKE_FFPROBE: &str = r#"mode=streams
for arg; do
  [ "$arg" = "-show_format" ] && mode=format
  last=$arg
done
set -- $(head -c 64 "$last" 2>/dev/null | tr -d '\000')
if [ "$1" != "VIDEO" ]; then
  echo "$last: Invalid data found when processing input" >&2
  exit 1
fi
if [ "$mode" = format ]; then
  printf '{"format":{"duration":"%s","size":"%s"}}\n' "$2" "$(wc -c < "$last" | tr -d ' ')"
else
  printf '{"streams":[{"codec_type":"video"}]}\n'
fi"#;

/// Encoder that writes a tiny valid output to its last argument
pub const FAKE_FFMPEG_SMALL: &str = r#"for last; do :; done
echo "out_time_us=0"
echo "progress=end"
printf 'VIDEO 1' > "$last""#;

/// Encoder that leaves a truncated file behind and fails
pub const FAKE_FFMPEG_CRASH: &str = r#"for last; do :; done
printf 'partial' > "$last"
echo "Error while encoding" >&2
exit 1"#;

/// Write an executable `/bin/sh` script and return its path
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Create a fake video of `len` bytes with the given duration marker
pub fn write_video(path: &Path, duration_secs: u32, len: u64) {
    std::fs::write(path, format!("VIDEO {}\n", duration_secs)).unwrap();
    std::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .unwrap()
        .set_len(len)
        .unwrap();
}
