//! FEN (Forsyth-Edwards Notation) parsing.

use crate::{Piece, Point, Side};
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 4 or 6 parts, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),
}

/// Castling availability per side, indexed by [`Side::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenCastling {
    pub short: [bool; 2],
    pub long: [bool; 2],
}

/// Parsed FEN data.
///
/// Holds the decoded components; the engine turns them into a board and
/// game rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenParser {
    /// Occupied points, in FEN reading order (rank 8 first).
    pub placement: Vec<(Point, Piece)>,
    pub side_to_move: Side,
    pub castling: FenCastling,
    /// En passant target square (the square the pawn skipped).
    pub en_passant: Option<Point>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl FenParser {
    /// The standard starting position FEN.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Parses a FEN string. The halfmove clock and fullmove number may be omitted.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() != 4 && parts.len() != 6 {
            return Err(FenError::InvalidPartCount(parts.len()));
        }

        let placement = Self::parse_placement(parts[0])?;

        let side_to_move = match parts[1] {
            "w" => Side::White,
            "b" => Side::Black,
            other => return Err(FenError::InvalidActiveColor(other.to_string())),
        };

        let castling = Self::parse_castling(parts[2])?;
        let en_passant = Self::parse_en_passant(parts[3], side_to_move)?;

        let (halfmove_clock, fullmove_number) = if parts.len() == 6 {
            let halfmove = parts[4]
                .parse::<u32>()
                .map_err(|_| FenError::InvalidHalfmoveClock(parts[4].to_string()))?;
            let fullmove = parts[5]
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=Self::MAX_FULLMOVE).contains(n))
                .ok_or_else(|| FenError::InvalidFullmoveNumber(parts[5].to_string()))?;
            (halfmove, fullmove)
        } else {
            (0, 1)
        };

        Ok(FenParser {
            placement,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Largest fullmove number whose position counter fits in a `u32`.
    pub const MAX_FULLMOVE: u32 = u32::MAX / 2;

    /// Half-move position counter: even when White is to move.
    pub fn position(&self) -> u32 {
        self.fullmove_number
            .saturating_sub(1)
            .saturating_mul(2)
            .saturating_add(self.side_to_move.index() as u32)
    }

    fn parse_placement(placement: &str) -> Result<Vec<(Point, Piece)>, FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        let mut pieces = Vec::with_capacity(32);
        for (i, rank) in ranks.iter().enumerate() {
            let row = 7 - i as u8;
            let mut col: u8 = 0;
            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                    col = col
                        .checked_add(skip as u8)
                        .filter(|col| *col <= 8)
                        .ok_or_else(|| {
                            FenError::InvalidPiecePlacement(format!("rank {} is too long", row + 1))
                        })?;
                } else if let Some(piece) = Piece::from_fen_char(c) {
                    let point = Point::new(row, col).map_err(|_| {
                        FenError::InvalidPiecePlacement(format!("rank {} is too long", row + 1))
                    })?;
                    pieces.push((point, piece));
                    col += 1;
                } else {
                    return Err(FenError::InvalidPiecePlacement(format!(
                        "invalid character '{}' in rank {}",
                        c,
                        row + 1
                    )));
                }
            }
            if col != 8 {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "rank {} has {} squares, expected 8",
                    row + 1,
                    col
                )));
            }
        }
        Ok(pieces)
    }

    fn parse_castling(castling: &str) -> Result<FenCastling, FenError> {
        let mut rights = FenCastling::default();
        if castling == "-" {
            return Ok(rights);
        }
        for c in castling.chars() {
            match c {
                'K' => rights.short[Side::White.index()] = true,
                'Q' => rights.long[Side::White.index()] = true,
                'k' => rights.short[Side::Black.index()] = true,
                'q' => rights.long[Side::Black.index()] = true,
                _ => {
                    return Err(FenError::InvalidCastlingRights(format!(
                        "invalid character '{}'",
                        c
                    )))
                }
            }
        }
        Ok(rights)
    }

    fn parse_en_passant(ep: &str, side_to_move: Side) -> Result<Option<Point>, FenError> {
        if ep == "-" {
            return Ok(None);
        }
        let point =
            Point::parse(ep).map_err(|_| FenError::InvalidEnPassantSquare(ep.to_string()))?;
        // the skipped square sits right behind the opponent's en passant row
        let expected_row = (side_to_move.en_passant_row() as i8 + side_to_move.pawn_direction()) as u8;
        if point.row() != expected_row {
            return Err(FenError::InvalidEnPassantSquare(ep.to_string()));
        }
        Ok(Some(point))
    }
}
