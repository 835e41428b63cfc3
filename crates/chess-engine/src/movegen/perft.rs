//! Perft (performance test) for move generator validation.
//!
//! Perft counts the number of leaf nodes at a given depth, which can be
//! compared against known-correct values to validate the move generator.
//! The board is mutated in place and rolled back after each child.

use super::MoveGenerator;
use crate::{apply_move, undo_move, Board, BoardView, EngineError, Rights};

/// Counts the number of leaf nodes at the given depth.
pub fn perft(
    generator: &MoveGenerator,
    board: &mut Board,
    rights: &mut Rights,
    depth: u32,
) -> Result<u64, EngineError> {
    if depth == 0 {
        return Ok(1);
    }

    let moves = generator.legal_moves(&*board, rights, board.side_to_move())?;
    if depth == 1 {
        return Ok(moves.len() as u64);
    }

    let mut nodes = 0u64;
    for &m in &moves {
        let applied = apply_move(board, rights, m)?;
        nodes += perft(generator, board, rights, depth - 1)?;
        undo_move(board, rights, &applied)?;
    }
    Ok(nodes)
}

/// Perft with divide: node count below each root move, sorted by move text.
pub fn perft_divide(
    generator: &MoveGenerator,
    board: &mut Board,
    rights: &mut Rights,
    depth: u32,
) -> Result<Vec<(String, u64)>, EngineError> {
    let moves = generator.legal_moves(&*board, rights, board.side_to_move())?;
    let mut results = Vec::with_capacity(moves.len());

    for &m in &moves {
        let applied = apply_move(board, rights, m)?;
        let nodes = if depth > 1 {
            perft(generator, board, rights, depth - 1)?
        } else {
            1
        };
        undo_move(board, rights, &applied)?;
        results.push((m.to_string(), nodes));
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(results)
}
