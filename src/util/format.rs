const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

pub fn pretty_size_from_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

pub fn block_list(blocks: &[u64]) -> String {
    let ids: Vec<String> = blocks.iter().map(|b| b.to_string()).collect();
    format!("[{}]", ids.join(", "))
}
