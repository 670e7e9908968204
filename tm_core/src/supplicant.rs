//! wpa_supplicant configuration: rendering and installation.
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;

use tm_traits::Shell;
use tracing::{info, warn};

use crate::config::PersistCfg;
use crate::error::{Result, TmError};
use crate::types::WifiCredential;

pub const PREAMBLE: [&str; 2] = [
    "ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=netdev",
    "update_config=1",
];

const INDENT: &str = "        ";

/// Bytes of an SSID typed with backslash escapes.
///
/// Plain characters contribute their UTF-8 bytes. Escapes follow the
/// usual string-literal set: `\xHH`, up to three octal digits, `\uXXXX`,
/// `\UXXXXXXXX` and the single-letter controls. Escaped code points above
/// 0xFF cannot be written as one byte and are rejected. An unknown escape
/// is kept verbatim, backslash included.
pub fn decode_escaped_ssid(ssid: &str) -> std::result::Result<Vec<u8>, TmError> {
    let bad = |why: &str| TmError::InvalidSsid(format!("{ssid:?}: {why}"));
    let raw = ssid.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let Some(&esc) = raw.get(i) else {
            return Err(bad("trailing backslash"));
        };
        i += 1;
        let simple = match esc {
            b'\n' => continue,
            b'\\' | b'\'' | b'"' => Some(esc),
            b'a' => Some(0x07),
            b'b' => Some(0x08),
            b'f' => Some(0x0c),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'v' => Some(0x0b),
            _ => None,
        };
        if let Some(v) = simple {
            out.push(v);
            continue;
        }
        let code = match esc {
            b'0'..=b'7' => {
                let mut v = u32::from(esc - b'0');
                for _ in 0..2 {
                    match raw.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            v = v * 8 + u32::from(d - b'0');
                            i += 1;
                        }
                        _ => break,
                    }
                }
                v
            }
            b'x' | b'u' | b'U' => {
                let width = match esc {
                    b'x' => 2,
                    b'u' => 4,
                    _ => 8,
                };
                let digits = raw
                    .get(i..i + width)
                    .filter(|d| d.iter().all(u8::is_ascii_hexdigit))
                    .ok_or_else(|| bad("truncated or malformed hex escape"))?;
                i += width;
                digits
                    .iter()
                    .fold(0u32, |v, &d| (v << 4) | char::from(d).to_digit(16).unwrap_or(0))
            }
            b'N' => return Err(bad("named escapes are not supported")),
            _ => {
                out.push(b'\\');
                out.push(esc);
                continue;
            }
        };
        let byte = u8::try_from(code).map_err(|_| bad("escaped character above \\xff"))?;
        out.push(byte);
    }
    Ok(out)
}

/// `ssid=...` line body: raw lowercase hex for escaped names, quoted otherwise.
pub fn ssid_value(ssid: &str) -> std::result::Result<String, TmError> {
    if !ssid.contains("\\x") {
        return Ok(format!("\"{ssid}\""));
    }
    let bytes = decode_escaped_ssid(ssid)?;
    let mut hex = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(hex, "{b:02x}");
    }
    Ok(hex)
}

/// Full file contents for one credential. Identical input renders
/// identical bytes.
pub fn render_config(cred: &WifiCredential) -> std::result::Result<String, TmError> {
    let mut lines: Vec<String> = PREAMBLE.iter().map(ToString::to_string).collect();
    lines.push(format!("country={}", cred.country));
    lines.push(String::new());
    lines.push("network={".into());
    lines.push(format!("{INDENT}ssid={}", ssid_value(&cred.ssid)?));
    if cred.is_open() {
        if !cred.extra.contains("key_mgmt") {
            lines.push(format!("{INDENT}key_mgmt=NONE"));
        }
        if !cred.extra.contains("priority") {
            lines.push(format!("{INDENT}priority=0"));
        }
    } else {
        lines.push(format!("{INDENT}psk=\"{}\"", cred.passkey));
    }
    for (k, v) in cred.extra.iter() {
        lines.push(format!("{INDENT}{k}={v}"));
    }
    lines.push("}".into());
    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// Write `bytes` to a sibling temp file and rename it over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

// Single-quote a path for `sh -c`.
fn quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

fn persist_err(what: &str, e: impl std::fmt::Display) -> eyre::Report {
    eyre::Report::new(TmError::Persist(format!("{what}: {e}")))
}

fn run_checked<S: Shell + ?Sized>(shell: &mut S, cmd: &str) -> Result<()> {
    match shell.status(cmd) {
        Ok(true) => Ok(()),
        Ok(false) => Err(persist_err(cmd, "exited non-zero")),
        Err(e) => Err(persist_err(cmd, e)),
    }
}

/// Install `text` at `cfg.wpa_path`, keeping the previous file as a single
/// `.bak` when backups are on.
///
/// Privileged mode stages the file and moves it into place with `sudo`,
/// then resets ownership. Otherwise the file is replaced with plain IO.
pub fn persist<S: Shell + ?Sized>(shell: &mut S, cfg: &PersistCfg, text: &str) -> Result<()> {
    let target = &cfg.wpa_path;
    let had_previous = target.exists();
    if cfg.privileged {
        fs::write(&cfg.staging_path, text)
            .map_err(|e| persist_err(&format!("write {}", cfg.staging_path.display()), e))?;
        if cfg.backup && had_previous {
            run_checked(
                shell,
                &format!("sudo cp {} {}", quote(target), quote(&cfg.backup_path())),
            )?;
        }
        run_checked(
            shell,
            &format!("sudo mv {} {}", quote(&cfg.staging_path), quote(target)),
        )?;
        run_checked(
            shell,
            &format!("sudo chown {}:{} {}", cfg.owner, cfg.group, quote(target)),
        )?;
    } else {
        if cfg.backup && had_previous {
            fs::copy(target, cfg.backup_path())
                .map_err(|e| persist_err(&format!("backup {}", target.display()), e))?;
        }
        write_atomic(target, text.as_bytes())
            .map_err(|e| persist_err(&format!("write {}", target.display()), e))?;
    }
    if !cfg.backup && had_previous {
        warn!(path = %target.display(), "previous config replaced without backup");
    }
    info!(path = %target.display(), privileged = cfg.privileged, "network config written");
    Ok(())
}

/// Render and install in one step.
pub fn write_credential<S: Shell + ?Sized>(
    shell: &mut S,
    cfg: &PersistCfg,
    cred: &WifiCredential,
) -> Result<()> {
    let text = render_config(cred)?;
    persist(shell, cfg, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Home", "\"Home\"")]
    #[case("caf\\xc3\\xa9", "636166c3a9")]
    #[case("a\\\\b\\x41", "615c6241")]
    #[case("\u{e9}\\x00", "c3a900")]
    #[case("Caf\\x00e9", "436166006539")]
    #[case("a\\nb\\x41", "610a6241")]
    #[case("\u{263a}\\x41", "e298ba41")]
    #[case("\\101\\x41\\t", "414109")]
    #[case("\\u00e9\\x41\\q", "e9415c71")]
    fn ssid_encoding(#[case] ssid: &str, #[case] want: &str) {
        assert_eq!(ssid_value(ssid).unwrap(), want);
    }

    #[rstest]
    #[case("bad\\x4")]
    #[case("bad\\xzz")]
    #[case("\\x41\\u0100")]
    #[case("\\x41\\777")]
    #[case("\\x41\\")]
    fn rejects_undecodable_ssid(#[case] ssid: &str) {
        assert!(matches!(ssid_value(ssid), Err(TmError::InvalidSsid(_))));
    }

    #[test]
    fn secured_network_block() {
        let cred = WifiCredential::new("HomeNet", "hunter22", "US").with_field("scan_ssid", "1");
        let text = render_config(&cred).unwrap();
        assert_eq!(
            text,
            "ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=netdev\n\
             update_config=1\n\
             country=US\n\
             \n\
             network={\n\
             \x20       ssid=\"HomeNet\"\n\
             \x20       psk=\"hunter22\"\n\
             \x20       scan_ssid=1\n\
             }\n"
        );
        assert!(!text.contains("key_mgmt"));
    }

    #[test]
    fn open_network_block() {
        let text = render_config(&WifiCredential::new("Cafe", "", "GB")).unwrap();
        assert!(text.contains("        key_mgmt=NONE\n        priority=0\n"));
        assert!(!text.contains("psk="));
    }

    #[test]
    fn open_network_respects_explicit_priority() {
        let cred = WifiCredential::new("Cafe", "", "GB").with_field("priority", "3");
        let text = render_config(&cred).unwrap();
        assert!(!text.contains("priority=0"));
        assert!(text.contains("priority=3"));
    }
}
