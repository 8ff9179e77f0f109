//! Parsing of process-listing tool output.

/// Lowest pid from `pidof` output (space separated).
#[cfg_attr(windows, allow(dead_code))]
pub fn parse_pidof(out: &str) -> Result<u32, String> {
    lowest(out.split_whitespace())
}

/// Lowest pid from `tasklist /FO CSV` output. The first line is the header
/// and the pid is the second column.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn parse_tasklist(out: &str) -> Result<u32, String> {
    if out.contains("No tasks are running") {
        return Err("no matching process".to_string());
    }

    let pids = out
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.trim()
                .trim_matches('"')
                .split("\",\"")
                .nth(1)
                .unwrap_or_default()
        });

    lowest(pids)
}

fn lowest<'a>(fields: impl Iterator<Item = &'a str>) -> Result<u32, String> {
    let mut min: Option<u32> = None;
    for field in fields {
        let pid: u32 = field
            .parse()
            .map_err(|_| format!("invalid pid {field:?}"))?;
        min = Some(min.map_or(pid, |m| m.min(pid)));
    }
    min.ok_or_else(|| "no matching process".to_string())
}
