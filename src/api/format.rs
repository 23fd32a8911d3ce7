const RUPEE: char = '₹';

/// Formats an amount as whole rupees with Indian digit grouping, e.g. `₹12,34,568`.
pub fn format_inr(amount: f64) -> String {
    if amount.is_nan() {
        return format!("{RUPEE}NaN");
    }

    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    if rounded.is_infinite() {
        return format!("{sign}{RUPEE}∞");
    }

    let digits = format!("{:.0}", rounded.abs());
    format!("{sign}{RUPEE}{}", group_indian(&digits))
}

// Last three digits form one group, everything above is grouped in pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 2);
    let lead = head.len() % 2;
    if lead > 0 {
        grouped.push_str(&head[..lead]);
    }
    for pair in head.as_bytes()[lead..].chunks(2) {
        if !grouped.is_empty() {
            grouped.push(',');
        }
        grouped.extend(pair.iter().map(|b| *b as char));
    }
    grouped.push(',');
    grouped.push_str(tail);
    grouped
}
