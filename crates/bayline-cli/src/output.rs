use bayline_core::Bay;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Bay list as loaded for `serve`.
pub fn print_bays(bays: &[Bay]) {
    let rows: Vec<[String; 4]> = bays
        .iter()
        .map(|b| {
            let location: &str = if b.location.is_empty() { "-" } else { &b.location };
            let status = if b.is_available { "free" } else { "in use" };
            [b.id.clone(), b.name.clone(), location.to_string(), status.to_string()]
        })
        .collect();
    println!("{}", render_table(["BAY", "NAME", "LOCATION", "STATUS"], &rows));
}

/// Dotted config keys and their effective values.
pub fn print_settings(settings: &[(&str, String)]) {
    let rows: Vec<[String; 2]> = settings
        .iter()
        .map(|(key, value)| [key.to_string(), value.clone()])
        .collect();
    println!("{}", render_table(["KEY", "VALUE"], &rows));
}

/// Left-aligned columns two spaces apart, with a dashed rule under the header.
fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let widths: [usize; N] = std::array::from_fn(|i| {
        rows.iter()
            .map(|row| row[i].len())
            .fold(headers[i].len(), usize::max)
    });

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let mut lines = vec![
        line(headers.into_iter(), &widths),
        line(rule.iter().map(String::as_str), &widths),
    ];
    lines.extend(rows.iter().map(|row| line(row.iter().map(String::as_str), &widths)));
    lines.join("\n")
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, w)| format!("{cell:w$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_widest_cell() {
        let rows = [
            ["bay-1".to_string(), "north".to_string()],
            ["bay-12".to_string(), "-".to_string()],
        ];
        let table = render_table(["BAY", "LOCATION"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(
            lines,
            vec![
                "BAY     LOCATION",
                "------  --------",
                "bay-1   north",
                "bay-12  -",
            ]
        );
    }

    #[test]
    fn empty_table_is_header_and_rule() {
        let table = render_table(["KEY", "VALUE"], &[]);
        assert_eq!(table, "KEY  VALUE\n---  -----");
    }
}
