use std::collections::BTreeMap;

use crate::model::{Row, Token};

/// Rows clustered from a token slice, along with the token indices that
/// survived blank and outlier filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Clustering {
    pub kept: Vec<usize>,
    pub rows: Vec<Row>,
}

pub(crate) fn group_by_page(tokens: &[Token]) -> BTreeMap<u32, Vec<Token>> {
    let mut pages: BTreeMap<u32, Vec<Token>> = BTreeMap::new();
    for token in tokens {
        pages
            .entry(token.page_number)
            .or_default()
            .push(token.clone());
    }
    pages
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Drops blank tokens, then tokens far from the median y. Falls back to the
/// non-blank set when the distance filter would leave nothing.
fn filter_noise(tokens: &[Token], outlier_distance: f64) -> Vec<usize> {
    let non_blank = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| !token.is_blank())
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let mut ys = non_blank
        .iter()
        .map(|&index| tokens[index].y)
        .collect::<Vec<_>>();
    let Some(median_y) = median(&mut ys) else {
        return non_blank;
    };

    let near = non_blank
        .iter()
        .copied()
        .filter(|&index| (tokens[index].y - median_y).abs() <= outlier_distance)
        .collect::<Vec<_>>();

    if near.is_empty() { non_blank } else { near }
}

/// First-fit row assignment over `order`, which must already be sorted by y.
/// A token joins the first row whose representative y is within `y_tol`;
/// representatives never move once a row is opened.
pub(crate) fn assign_rows(tokens: &[Token], order: &[usize], y_tol: f64) -> Vec<Row> {
    order.iter().fold(Vec::new(), |mut rows: Vec<Row>, &index| {
        let y = tokens[index].y;
        match rows.iter_mut().find(|row| (row.y - y).abs() <= y_tol) {
            Some(row) => row.members.push(index),
            None => rows.push(Row::start(y, index)),
        }
        rows
    })
}

/// Merges each row with its successor when their representatives are within
/// `y_tol`. A merged pair is not reconsidered against the next row.
pub(crate) fn merge_adjacent_rows(rows: Vec<Row>, y_tol: f64) -> Vec<Row> {
    let mut merged = Vec::with_capacity(rows.len());
    let mut iter = rows.into_iter().peekable();

    while let Some(mut current) = iter.next() {
        if let Some(next) = iter.next_if(|next| (next.y - current.y).abs() <= y_tol) {
            current.members.extend(next.members);
        }
        merged.push(current);
    }

    merged
}

pub(crate) fn cluster_rows(tokens: &[Token], y_tol: f64, outlier_distance: f64) -> Clustering {
    let kept = filter_noise(tokens, outlier_distance);

    let mut order = kept.clone();
    order.sort_by(|&left, &right| tokens[left].y.total_cmp(&tokens[right].y));

    let rows = merge_adjacent_rows(assign_rows(tokens, &order, y_tol), y_tol);
    Clustering { kept, rows }
}
