//! Parameter summaries for the `CMD` audit column.
//!
//! Pure presentation: maps a decoded command's parameter bytes to the short
//! human-readable description logged next to the mnemonic. Unknown shapes
//! fall back to a hex dump, so every command gets some summary.

use escpos_emu_audit::hex_dump;

use crate::command::Command;

/// Bit flags of the `ESC !` print mode byte.
static PRINT_MODE_BITS: &[(u8, &str)] = &[
    (0x01, "Font B"),
    (0x08, "加粗"),
    (0x10, "倍高"),
    (0x20, "倍寬"),
    (0x80, "底線"),
];

/// Produce the one-line parameter summary for a decoded command.
pub fn summarize(cmd: &Command) -> String {
    if let Some(text) = &cmd.text {
        return format!("\"{text}\"");
    }
    describe_params(&cmd.mnemonic, &cmd.params)
}

/// Describe the `ESC !` print mode byte.
pub fn describe_print_mode(n: u8) -> String {
    if n == 0 {
        return "Font A".to_string();
    }
    let parts: Vec<&str> = PRINT_MODE_BITS
        .iter()
        .filter(|(bit, _)| n & *bit != 0)
        .map(|(_, desc)| *desc)
        .collect();
    if parts.is_empty() {
        format!("0x{n:02x}")
    } else {
        parts.join(", ")
    }
}

fn alignment(n: u8) -> String {
    match n {
        0 => "靠左".to_string(),
        1 => "置中".to_string(),
        2 => "靠右".to_string(),
        _ => format!("未知 {n}"),
    }
}

fn font(n: u8) -> String {
    match n {
        0 | 48 => "Font A".to_string(),
        1 | 49 => "Font B".to_string(),
        _ => format!("n={n}"),
    }
}

fn enabled(n: u8) -> String {
    if n & 1 != 0 { "啟用" } else { "停用" }.to_string()
}

fn cut_mode(m: u8) -> String {
    match m {
        0 | 48 => "全切".to_string(),
        1 | 49 => "部分切".to_string(),
        65 => "進紙後全切".to_string(),
        66 => "進紙後部分切".to_string(),
        _ => format!("模式 {m}"),
    }
}

fn country(n: u8) -> String {
    let name = match n {
        0 => "美國",
        1 => "法國",
        2 => "德國",
        3 => "英國",
        4 => "丹麥I",
        5 => "瑞典",
        6 => "義大利",
        7 => "西班牙I",
        8 => "日本",
        9 => "挪威",
        10 => "丹麥II",
        11 => "西班牙II",
        12 => "拉丁美洲",
        13 => "韓國",
        15 => "中國",
        _ => return format!("n={n}"),
    };
    name.to_string()
}

fn u16_le(lo: u8, hi: u8) -> usize {
    lo as usize | (hi as usize) << 8
}

fn describe_params(mnemonic: &str, params: &[u8]) -> String {
    match (mnemonic, params) {
        ("ESC !", [n, ..]) => format!("n=0x{n:02X} ({})", describe_print_mode(*n)),
        ("ESC a", [n, ..]) => format!("n={n} ({})", alignment(*n)),
        ("ESC d", [n, ..]) => format!("n={n} 行"),
        ("ESC J" | "ESC 3", [n, ..]) => format!("n={n} 點"),
        ("ESC E" | "ESC B" | "ESC G" | "ESC {" | "GS B" | "FS -", [n, ..]) => enabled(*n),
        ("ESC -", [n, ..]) => match *n {
            0 => "停用".to_string(),
            1 => "一點底線".to_string(),
            2 => "二點底線".to_string(),
            n => format!("n={n}"),
        },
        ("ESC M" | "GS f", [n, ..]) => font(*n),
        ("ESC $", [nl, nh, ..]) => format!("位置={}", u16_le(*nl, *nh)),
        ("ESC t", [n, ..]) => format!("碼頁={n}"),
        ("ESC R", [n, ..]) => country(*n),
        ("ESC p", [m, t1, ..]) => format!("m={m}, t1={t1}"),
        ("ESC V" | "ESC r" | "ESC c" | "DLE ENQ", [n, ..]) => format!("n={n}"),

        ("ESC *", [m, nl, nh, data @ ..]) => {
            format!("m={m}, 寬={} 點, 資料={} bytes", u16_le(*nl, *nh), data.len())
        }
        ("ESC D", stops) => {
            let stops = match stops.split_last() {
                Some((&0, init)) => init,
                _ => stops,
            };
            if stops.is_empty() {
                "清除定位".to_string()
            } else {
                let list: Vec<String> = stops.iter().map(|t| t.to_string()).collect();
                format!("定位: {}", list.join(", "))
            }
        }

        ("DLE EOT", [n, ..]) => {
            let desc = match *n {
                1 => "印表機狀態",
                2 => "離線狀態",
                3 => "錯誤狀態",
                4 => "紙張感測器狀態",
                _ => return format!("n={n} (未知 {n})"),
            };
            format!("n={n} ({desc})")
        }
        ("DLE DC4", [f, m, t, ..]) => format!("fn={f}, m={m}, t={t}"),

        ("GS !", [n, ..]) => {
            let w = (*n >> 4) + 1;
            let h = (*n & 0x0F) + 1;
            format!("n=0x{n:02X} (寬{w}倍, 高{h}倍)")
        }
        ("GS H", [n, ..]) => match *n {
            0 => "不列印".to_string(),
            1 => "上方".to_string(),
            2 => "下方".to_string(),
            3 => "上下皆列印".to_string(),
            n => format!("n={n}"),
        },
        ("GS h", [n, ..]) => format!("高度={n} 點"),
        ("GS w", [n, ..]) => format!("寬度={n}"),
        ("GS a" | "FS !", [n, ..]) => format!("n=0x{n:02X}"),
        ("GS L", [nl, nh, ..]) => format!("左邊界={}", u16_le(*nl, *nh)),
        ("GS W", [nl, nh, ..]) => format!("寬度={}", u16_le(*nl, *nh)),
        ("GS r", [n, ..]) => {
            let desc = match *n {
                1 => "紙張感測器",
                2 => "錢箱狀態",
                _ => return format!("n={n} (未知 {n})"),
            };
            format!("n={n} ({desc})")
        }
        ("GS I", [n, ..]) => {
            let desc = match *n {
                1 => "印表機型號",
                2 => "印表機類型",
                3 => "韌體版本",
                _ => return format!("n={n} (未知 {n})"),
            };
            format!("n={n} ({desc})")
        }

        ("GS V", [m]) => cut_mode(*m),
        ("GS V", [m, n, ..]) => format!("{}, 進紙 n={n}", cut_mode(*m)),

        ("GS k", [m, rest @ ..]) => {
            let data = if *m <= 6 {
                // Format A carries a trailing NUL sentinel.
                match rest.split_last() {
                    Some((&0, init)) => init,
                    _ => rest,
                }
            } else if rest.is_empty() {
                rest
            } else {
                &rest[1..]
            };
            format!("類型={m}, 資料=\"{}\"", String::from_utf8_lossy(data))
        }

        ("GS v 0", [m, xl, xh, yl, yh, data @ ..]) => {
            let x = u16_le(*xl, *xh);
            let y = u16_le(*yl, *yh);
            format!("m={m}, 寬={} 點, 高={y} 點, 資料={} bytes", x * 8, data.len())
        }

        (m, [_, _, data @ ..]) if m.starts_with("GS ( ") => format!("資料={} bytes", data.len()),

        ("FS p", [n, m, ..]) => format!("n={n}, m={m}"),

        (_, p) => hex_dump(p),
    }
}
