use super::constants::APPLE_COUNT;
use super::grid::CellGrid;
use super::snake::grow;
use super::types::{Cell, Player};

pub fn init_apples(grid: &mut CellGrid) -> Vec<Cell> {
    let mut apples = Vec::with_capacity(APPLE_COUNT);
    top_up_apples(&mut apples, grid);
    apples
}

/// Refills the pool up to `APPLE_COUNT` while free cells remain. Returns how
/// many apples were placed.
pub fn top_up_apples(apples: &mut Vec<Cell>, grid: &mut CellGrid) -> usize {
    let mut placed = 0;
    while apples.len() < APPLE_COUNT {
        let Some(cell) = grid.take_random_free() else { break };
        apples.push(cell);
        placed += 1;
    }
    placed
}

/// Re-seeds every apple against a freshly built grid at game start.
pub fn reset_apples(apples: &mut Vec<Cell>, grid: &mut CellGrid) {
    apples.clear();
    top_up_apples(apples, grid);
}

/// Lets an alive player eat the apple under its head. The eaten apple moves
/// to a new free cell, or leaves the pool until a cell frees up.
pub fn eat(player: &mut Player, apples: &mut Vec<Cell>, grid: &mut CellGrid) -> bool {
    if !player.alive {
        return false;
    }
    let Some(head) = player.head() else { return false };
    let Some(index) = apples.iter().position(|apple| *apple == head) else { return false };

    // The head now holds the apple's cell, so it stays occupied.
    grow(player);
    match grid.take_random_free() {
        Some(cell) => apples[index] = cell,
        None => {
            apples.remove(index);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn init_places_distinct_occupied_apples() {
        let mut grid = CellGrid::new(20, 20);
        let apples = init_apples(&mut grid);

        assert_eq!(apples.len(), APPLE_COUNT);
        let unique: HashSet<Cell> = apples.iter().copied().collect();
        assert_eq!(unique.len(), APPLE_COUNT);
        for apple in &apples {
            assert!(!grid.is_free(*apple));
        }
        assert_eq!(grid.free_count(), 400 - APPLE_COUNT);
    }

    #[test]
    fn small_grid_yields_a_short_pool() {
        let mut grid = CellGrid::new(2, 2);
        let apples = init_apples(&mut grid);
        assert_eq!(apples.len(), 4);
        assert_eq!(grid.free_count(), 0);
    }

    #[test]
    fn eating_grows_and_relocates_the_apple() {
        let mut grid = CellGrid::new(20, 20);
        let mut apples = init_apples(&mut grid);
        let target = apples[2];

        let mut player = Player::new("p1".to_string(), Some(target));
        player.segments.push_back(Cell::new(target.x, target.y + 1));

        assert!(eat(&mut player, &mut apples, &mut grid));

        assert_eq!(player.segments.len(), 3);
        assert_eq!(apples.len(), APPLE_COUNT);
        assert!(!apples.contains(&target));
        assert!(!grid.is_free(target));
        assert!(!grid.is_free(apples[2]));
    }

    #[test]
    fn eating_without_free_cells_shrinks_the_pool() {
        let mut grid = CellGrid::new(2, 1);
        let mut apples = vec![Cell::new(0, 0)];
        grid.remove(Cell::new(0, 0)).unwrap();
        grid.remove(Cell::new(1, 0)).unwrap();

        let mut player = Player::new("p1".to_string(), Some(Cell::new(0, 0)));
        assert!(eat(&mut player, &mut apples, &mut grid));

        assert!(apples.is_empty());
        assert_eq!(player.segments.len(), 2);

        grid.add(Cell::new(1, 0)).unwrap();
        assert_eq!(top_up_apples(&mut apples, &mut grid), 1);
        assert_eq!(apples, vec![Cell::new(1, 0)]);
    }

    #[test]
    fn dead_players_do_not_eat() {
        let mut grid = CellGrid::new(20, 20);
        let mut apples = init_apples(&mut grid);
        let before = apples.clone();

        let mut player = Player::new("p1".to_string(), Some(apples[0]));
        player.alive = false;

        assert!(!eat(&mut player, &mut apples, &mut grid));
        assert_eq!(apples, before);
        assert_eq!(player.segments.len(), 1);
    }
}
