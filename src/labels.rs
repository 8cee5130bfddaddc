use crate::model::{HeaderLabel, Token};

/// Reassembles header labels that wrap onto several lines.
///
/// Fragments are walked left to right; a fragment within `x_tol` of the open
/// label's x is appended to it, otherwise it opens a new label. Columns are
/// assumed not to overlap horizontally.
pub(crate) fn merge_wrapped_labels(fragments: &[&Token], x_tol: f64) -> Vec<HeaderLabel> {
    let mut sorted = fragments.to_vec();
    sorted.sort_by(|left, right| left.x.total_cmp(&right.x).then(left.y.total_cmp(&right.y)));

    let mut labels: Vec<HeaderLabel> = Vec::new();
    for fragment in sorted {
        match labels.last_mut() {
            Some(open) if (fragment.x - open.x).abs() <= x_tol => {
                open.text.push(' ');
                open.text.push_str(&fragment.text);
                open.y = open.y.min(fragment.y);
            }
            _ => labels.push(HeaderLabel {
                x: fragment.x,
                y: fragment.y,
                text: fragment.text.clone(),
            }),
        }
    }

    labels
}
