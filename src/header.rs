use crate::event::{EventSink, LayoutEvent};
use crate::labels::merge_wrapped_labels;
use crate::model::{HeaderInfo, HeaderLabel, Row, Token};
use crate::options::ParseOptions;
use crate::rows::cluster_rows;

const HEADER_KEYWORDS: [&str; 13] = [
    "date",
    "posting date",
    "transaction",
    "description",
    "money in",
    "money out",
    "balance",
    "payments",
    "deposits",
    "credit",
    "debit",
    "amount",
    "post date",
];

/// Number of distinct header keywords occurring in `text`.
pub(crate) fn keyword_hits(text: &str) -> usize {
    let lower = text.to_lowercase();
    HEADER_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RowScore {
    row: usize,
    hits: usize,
    spread: f64,
    cols: usize,
}

fn score_row(tokens: &[Token], row_index: usize, row: &Row) -> RowScore {
    let text = row
        .members
        .iter()
        .map(|&index| tokens[index].text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let (min_x, max_x) = row.members.iter().map(|&index| tokens[index].x).fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x), x| (min_x.min(x), max_x.max(x)),
    );

    RowScore {
        row: row_index,
        hits: keyword_hits(&text),
        spread: max_x - min_x,
        cols: row.members.len(),
    }
}

/// Picks the header among clustered rows: the rows with the most keyword
/// hits, at least `min_cols` wide, ranked by horizontal spread. Ties go to
/// the upper row.
pub(crate) fn select_header_row(tokens: &[Token], rows: &[Row], min_cols: usize) -> Option<usize> {
    let scores = rows
        .iter()
        .enumerate()
        .map(|(index, row)| score_row(tokens, index, row))
        .collect::<Vec<_>>();

    let max_hits = scores.iter().map(|score| score.hits).max()?;

    scores
        .iter()
        .filter(|score| score.hits == max_hits && score.cols >= min_cols)
        .fold(None, |best: Option<&RowScore>, score| match best {
            Some(current) if score.spread <= current.spread => Some(current),
            _ => Some(score),
        })
        .map(|score| score.row)
}

/// Header row found within one chunk of page tokens.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChunkHeader {
    pub y: f64,
    pub labels: Vec<HeaderLabel>,
}

pub(crate) fn detect_chunk_header(tokens: &[Token], options: &ParseOptions) -> Option<ChunkHeader> {
    let clustering = cluster_rows(tokens, options.y_tol, options.outlier_distance);
    let best = select_header_row(tokens, &clustering.rows, options.min_cols)?;
    let row = &clustering.rows[best];

    // Wrapped label lines sit just above or below the header baseline.
    let nearby = clustering.kept.iter().copied().filter(|index| {
        (tokens[*index].y - row.y).abs() <= options.y_tol * 2.0 && !row.members.contains(index)
    });

    let fragments = row
        .members
        .iter()
        .copied()
        .chain(nearby)
        .map(|index| &tokens[index])
        .collect::<Vec<_>>();

    Some(ChunkHeader {
        y: row.y,
        labels: merge_wrapped_labels(&fragments, options.header_x_tol),
    })
}

/// Finds the header for one page.
///
/// Tokens are scored in chunks of `chunk_size`. Every label of every chunk
/// header competes on (keyword hits, x); the chunk owning the winning label
/// supplies the whole header row.
pub(crate) fn find_header(
    page: u32,
    tokens: &[Token],
    options: &ParseOptions,
    sink: &mut dyn EventSink,
) -> Option<HeaderInfo> {
    let chunk_count = tokens.len().div_ceil(options.chunk_size);
    let mut best: Option<(usize, f64, ChunkHeader)> = None;

    for (chunk, chunk_tokens) in tokens.chunks(options.chunk_size).enumerate() {
        let Some(header) = detect_chunk_header(chunk_tokens, options) else {
            sink.emit(LayoutEvent::ChunkWithoutHeader {
                page,
                chunk,
                chunk_count,
            });
            continue;
        };

        let top_label = header
            .labels
            .iter()
            .map(|label| (keyword_hits(&label.text), label.x))
            .fold(None, |top: Option<(usize, f64)>, candidate| match top {
                Some(current) if !outranks(candidate, current) => Some(current),
                _ => Some(candidate),
            });

        if let Some((hits, x)) = top_label {
            let replace = best
                .as_ref()
                .is_none_or(|(best_hits, best_x, _)| outranks((hits, x), (*best_hits, *best_x)));
            if replace {
                best = Some((hits, x, header));
            }
        }
    }

    let (_, _, header) = best?;
    Some(HeaderInfo {
        y: header.y,
        headings: header.labels,
        page_number: page,
    })
}

fn outranks(candidate: (usize, f64), current: (usize, f64)) -> bool {
    candidate.0 > current.0 || (candidate.0 == current.0 && candidate.1 > current.1)
}
