// Always-in-the-market reversal strategy
use crate::models::PositionSide;

/// Single win/loss classification for a settled trade. Both the
/// direction policy and the cooldown use this, so a flat trade cannot
/// count as a win for one and a loss for the other.
///
/// Zero PnL is a loss.
pub fn trade_won(pnl: f64) -> bool {
    pnl > 0.0
}

/// Direction for the next trade: a winning trade keeps its side, a
/// losing one flips it. Every run starts long.
pub fn next_side(current: PositionSide, won: bool) -> PositionSide {
    if won {
        current
    } else {
        current.flipped()
    }
}
