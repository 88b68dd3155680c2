use super::types::{Cell, Player};

#[derive(Debug, Clone, Copy)]
pub struct Arena {
    pub width: i32,
    pub height: i32,
    pub borders: bool,
}

impl Arena {
    fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    fn wrap(&self, cell: Cell) -> Cell {
        Cell::new(cell.x.rem_euclid(self.width), cell.y.rem_euclid(self.height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Survived,
    NoBody,
    HitWall,
    HitSelf,
    HitOpponent,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Survived => "survived",
            Outcome::NoBody => "no_body",
            Outcome::HitWall => "hit_wall",
            Outcome::HitSelf => "hit_self",
            Outcome::HitOpponent => "hit_opponent",
        }
    }
}

/// Judges the player at `index` after its move. Other players are taken as
/// they stand, so anyone later in the order is still at its previous spot.
pub fn resolve_collisions(players: &mut [Player], index: usize, arena: &Arena) -> Outcome {
    let outcome = judge(players, index, arena);
    if outcome != Outcome::Survived {
        players[index].alive = false;
    }
    outcome
}

fn judge(players: &mut [Player], index: usize, arena: &Arena) -> Outcome {
    let player = &mut players[index];
    let Some(mut head) = player.head() else { return Outcome::NoBody };

    if !arena.contains(head) {
        if arena.borders {
            return Outcome::HitWall;
        }
        head = arena.wrap(head);
        player.segments[0] = head;
    }

    if player.segments.iter().skip(1).any(|segment| *segment == head) {
        return Outcome::HitSelf;
    }

    let hit_opponent = players
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != index)
        .any(|(_, other)| other.segments.contains(&head));
    if hit_opponent {
        return Outcome::HitOpponent;
    }

    Outcome::Survived
}
