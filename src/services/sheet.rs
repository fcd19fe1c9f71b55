use thiserror::Error;

use crate::core::config::MarkingSettings;

#[derive(Debug, Error)]
pub(crate) enum SheetError {
    #[error("Sheet must contain a header row and at least one answer row")]
    TooFewRows,
    #[error("Sheet must contain a student column and at least one question column")]
    TooFewColumns,
    #[error("Row {row} has {got} cells, expected {expected}")]
    RaggedRow { row: usize, expected: usize, got: usize },
    #[error("Sheet exceeds the limit of {limit} rows")]
    TooManyRows { limit: u64 },
    #[error("Sheet exceeds the limit of {limit} columns")]
    TooManyColumns { limit: u64 },
    #[error("Question title in column {column} is empty")]
    EmptyQuestionTitle { column: usize },
    #[error("Student name in row {row} is empty")]
    EmptyStudentName { row: usize },
}

/// Parsed answer sheet. Column 0 of the grid is the student column; every
/// other column is keyed by the question title in its header cell.
#[derive(Debug)]
pub(crate) struct AnswerSheet {
    pub(crate) question_titles: Vec<String>,
    pub(crate) rows: Vec<StudentRow>,
}

#[derive(Debug)]
pub(crate) struct StudentRow {
    pub(crate) student_name: String,
    /// One cell per question title, in header order. An empty cell means
    /// the student gave no answer.
    pub(crate) answers: Vec<Option<String>>,
}

/// Validates a rectangular grid of cells and splits it into header and
/// student rows.
pub(crate) fn parse_grid(
    grid: &[Vec<String>],
    limits: &MarkingSettings,
) -> Result<AnswerSheet, SheetError> {
    if grid.len() < 2 {
        return Err(SheetError::TooFewRows);
    }
    if grid.len() as u64 > limits.max_grid_rows {
        return Err(SheetError::TooManyRows { limit: limits.max_grid_rows });
    }

    let header = &grid[0];
    if header.len() < 2 {
        return Err(SheetError::TooFewColumns);
    }
    if header.len() as u64 > limits.max_grid_columns {
        return Err(SheetError::TooManyColumns { limit: limits.max_grid_columns });
    }

    let mut question_titles = Vec::with_capacity(header.len() - 1);
    for (index, title) in header.iter().enumerate().skip(1) {
        let title = title.trim();
        if title.is_empty() {
            return Err(SheetError::EmptyQuestionTitle { column: index });
        }
        question_titles.push(title.to_string());
    }

    let mut rows = Vec::with_capacity(grid.len() - 1);
    for (index, cells) in grid.iter().enumerate().skip(1) {
        if cells.len() != header.len() {
            return Err(SheetError::RaggedRow {
                row: index,
                expected: header.len(),
                got: cells.len(),
            });
        }

        let student_name = cells[0].trim();
        if student_name.is_empty() {
            return Err(SheetError::EmptyStudentName { row: index });
        }

        let answers = cells[1..]
            .iter()
            .map(|cell| {
                let cell = cell.trim();
                if cell.is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                }
            })
            .collect();

        rows.push(StudentRow { student_name: student_name.to_string(), answers });
    }

    Ok(AnswerSheet { question_titles, rows })
}

/// Renders a grid of cells as RFC 4180 CSV.
pub(crate) fn render_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let mut first = true;
        for cell in row {
            if !first {
                out.push(',');
            }
            first = false;
            out.push_str(&escape_cell(cell));
        }
        out.push_str("\r\n");
    }
    out
}

fn escape_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
