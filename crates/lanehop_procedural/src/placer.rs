//! Random placement of single-cell entities.

use rand::Rng;

use crate::chunk::Chunk;
use crate::seed::MapRng;
use lanehop_core::Entity;

/// Puts `entity` into a random empty cell, centred in it.
///
/// Returns false if the chunk has no empty cell.
pub fn place_random(chunk: &mut Chunk, rng: &mut MapRng, mut entity: Entity) -> bool {
    let empty = chunk.empty_cell_count();
    if empty == 0 {
        return false;
    }

    let pick = rng.gen_range(0..empty);
    let Some((row, col)) = chunk
        .cells()
        .iter()
        .filter(|c| c.is_empty())
        .nth(pick)
        .map(|c| (c.row, c.col))
    else {
        return false;
    };
    let Some(rect) = chunk.cell_rect(row, col) else {
        return false;
    };

    entity.place_at(
        rect.x + (rect.width - entity.width()) / 2,
        rect.y + (rect.height - entity.height()) / 2,
    );
    chunk.place_in_cell(row, col, entity)
}

/// Places up to `count` entities built by `make`. Returns how many fit.
pub fn place_many<F>(chunk: &mut Chunk, rng: &mut MapRng, count: u32, mut make: F) -> u32
where
    F: FnMut(&mut MapRng) -> Entity,
{
    let mut placed = 0;
    for _ in 0..count {
        let entity = make(rng);
        if !place_random(chunk, rng, entity) {
            break;
        }
        placed += 1;
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::TerrainType;
    use crate::seed::WorldSeed;
    use lanehop_core::CollectibleKind;

    #[test]
    fn test_entity_is_centred_in_its_cell() {
        let mut rng = WorldSeed::new(1).rng();
        let mut chunk = Chunk::new(TerrainType::Grass, 120, 800, 120, 40);
        assert!(place_random(
            &mut chunk,
            &mut rng,
            Entity::collectible(CollectibleKind::Coin, 0, 0)
        ));

        let cell = chunk.cells().iter().find(|c| !c.is_empty()).unwrap();
        let coin = cell.content.unwrap();
        let rect = chunk.cell_rect(cell.row, cell.col).unwrap();
        assert_eq!(coin.x(), rect.x + 10);
        assert_eq!(coin.y(), rect.y + 10);
    }

    #[test]
    fn test_full_chunk_rejects_placement() {
        let mut rng = WorldSeed::new(2).rng();
        let mut chunk = Chunk::new(TerrainType::Grass, 0, 80, 40, 40);
        let placed = place_many(&mut chunk, &mut rng, 5, |_| Entity::tree(0, 0, 30));
        assert_eq!(placed, 2);
        assert_eq!(chunk.empty_cell_count(), 0);
    }
}
