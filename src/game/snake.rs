use super::types::{Cell, Player};

/// Advances one player by a single step and returns the tail cell it left
/// behind, if any. Occupancy bookkeeping is left to the caller so it can run
/// after wall handling has settled where the head really is.
pub fn move_snake(player: &mut Player) -> Option<Cell> {
    if let Some(next) = player.inputs.pop_front() {
        // Input buffering already rejects reversals; a stale queue must not
        // turn the head back into the neck either.
        if player.direction.map_or(true, |current| !current.is_opposite(next)) {
            player.direction = Some(next);
        }
    }

    let head = player.head()?;
    let delta = player.direction.map_or((0, 0), |direction| direction.delta());
    player.segments.push_front(head.offset(delta));
    player.segments.pop_back()
}

/// Lengthens the body by one right away by doubling the tail. The next move
/// drops the copy instead of the real tail.
pub fn grow(player: &mut Player) {
    if let Some(tail) = player.segments.back().copied() {
        player.segments.push_back(tail);
    }
}

pub fn reset_snake(player: &mut Player, head: Option<Cell>) {
    player.segments.clear();
    player.segments.extend(head);
    player.direction = None;
    player.inputs.clear();
    player.alive = true;
    player.ready = false;
}
