//! # Moving Obstacle Manager
//!
//! One pool for every live car and train, no matter which chunk spawned
//! it. Hazards keep moving and wrapping after their chunk is evicted and
//! are only dropped when they leave the keep-alive band around the
//! viewport.
//!
//! All operations are forgiving: removing an unknown ID, querying an
//! empty pool, or pruning nothing are no-ops.

use lanehop_core::{Entity, EntityArena, EntityId, ObstacleKind};

/// Owner of the shared hazard pool.
#[derive(Clone, Debug, Default)]
pub struct MovingObstacleManager {
    pool: EntityArena<Entity>,
}

impl MovingObstacleManager {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool: EntityArena::new(),
        }
    }

    /// Number of live hazards.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pool.len()
    }

    /// Returns true if the pool is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Adds a hazard. Duplicates are distinct entries.
    pub fn add(&mut self, obstacle: Entity) -> EntityId {
        self.pool.insert(obstacle)
    }

    /// Adds several hazards, returning their IDs in order.
    pub fn add_all<I>(&mut self, obstacles: I) -> Vec<EntityId>
    where
        I: IntoIterator<Item = Entity>,
    {
        obstacles.into_iter().map(|o| self.pool.insert(o)).collect()
    }

    /// Removes a hazard. Unknown or stale IDs return `None`.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.pool.remove(id)
    }

    /// Looks up a hazard.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.pool.get(id)
    }

    /// Iterates over live hazards with their IDs.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.pool.iter()
    }

    /// Advances every hazard one tick.
    ///
    /// Movers wrap at the map edges. Afterwards, any two cars travelling the
    /// same way that now overlap both take the slower speed, so a fast car
    /// queues behind a slow one instead of driving through it.
    pub fn update_all(&mut self, map_width: i32) {
        for (_, obstacle) in self.pool.iter_mut() {
            obstacle.advance(map_width);
        }
        self.adapt_traffic();
    }

    fn adapt_traffic(&mut self) {
        let cars: Vec<(EntityId, Entity)> = self
            .pool
            .iter()
            .filter(|(_, e)| e.obstacle_kind() == Some(ObstacleKind::Car))
            .map(|(id, e)| (id, *e))
            .collect();

        for (i, (id_a, a)) in cars.iter().enumerate() {
            for (id_b, b) in &cars[i + 1..] {
                let same_way = a.speed().signum() == b.speed().signum() && a.speed() != 0;
                if !same_way || !a.intersects(b) {
                    continue;
                }
                let slower = if a.speed().abs() <= b.speed().abs() {
                    a.speed()
                } else {
                    b.speed()
                };
                for id in [*id_a, *id_b] {
                    if let Some(car) = self.pool.get_mut(id) {
                        car.set_speed(slower);
                    }
                }
            }
        }
    }

    /// Returns true if any hazard contains the point.
    #[must_use]
    pub fn check_collision(&self, x: i32, y: i32) -> bool {
        self.pool.iter().any(|(_, e)| e.contains_point(x, y))
    }

    /// Drops hazards whose top edge is outside `[min_y, max_y]`.
    ///
    /// Returns how many were dropped.
    pub fn cleanup_offscreen(&mut self, min_y: i32, max_y: i32) -> usize {
        let removed = self.pool.retain(|_, e| e.y() >= min_y && e.y() <= max_y);
        if removed > 0 {
            tracing::trace!(removed, min_y, max_y, "pruned off-screen hazards");
        }
        removed
    }

    /// Raises every hazard's speed magnitude by `factor`, keeping direction.
    ///
    /// A stationary hazard is treated as leftward-moving.
    pub fn increase_speed(&mut self, factor: i32) {
        for (_, obstacle) in self.pool.iter_mut() {
            let speed = obstacle.speed();
            obstacle.set_speed(if speed > 0 { speed + factor } else { speed - factor });
        }
    }

    /// Snapshot of the hazards of one kind.
    #[must_use]
    pub fn obstacles_by_kind(&self, kind: ObstacleKind) -> Vec<Entity> {
        self.pool
            .iter()
            .filter(|(_, e)| e.obstacle_kind() == Some(kind))
            .map(|(_, e)| *e)
            .collect()
    }

    /// Snapshot of every live hazard.
    #[must_use]
    pub fn active_obstacles(&self) -> Vec<Entity> {
        self.pool.iter().map(|(_, e)| *e).collect()
    }

    /// Restores every hazard to its spawn position and speed.
    pub fn reset_all(&mut self) {
        for (_, obstacle) in self.pool.iter_mut() {
            obstacle.reset();
        }
    }

    /// Drops every hazard.
    pub fn clear(&mut self) {
        self.pool.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_and_duplicates() {
        let mut manager = MovingObstacleManager::new();
        let car = Entity::car(0, 0, 2);
        let a = manager.add(car);
        let b = manager.add(car);
        assert_ne!(a, b);
        assert_eq!(manager.len(), 2);

        assert!(manager.remove(a).is_some());
        assert!(manager.remove(a).is_none());
        assert!(manager.get(b).is_some());
    }

    #[test]
    fn test_empty_pool_is_harmless() {
        let mut manager = MovingObstacleManager::new();
        manager.update_all(800);
        manager.increase_speed(3);
        manager.reset_all();
        assert!(!manager.check_collision(0, 0));
        assert_eq!(manager.cleanup_offscreen(0, 10), 0);
        assert!(manager.active_obstacles().is_empty());
    }

    #[test]
    fn test_update_wraps() {
        let mut manager = MovingObstacleManager::new();
        let right = manager.add(Entity::car(799, 0, 2));
        let left = manager.add(Entity::car(-49, 100, -2));
        manager.update_all(800);
        assert_eq!(manager.get(right).unwrap().x(), -Entity::CAR_WIDTH);
        assert_eq!(manager.get(left).unwrap().x(), 800);
    }

    #[test]
    fn test_collision_point() {
        let mut manager = MovingObstacleManager::new();
        manager.add(Entity::train(100, 40, 3));
        assert!(manager.check_collision(150, 50));
        assert!(!manager.check_collision(150, 80));
        assert!(!manager.check_collision(99, 50));
    }

    #[test]
    fn test_cleanup_band() {
        let mut manager = MovingObstacleManager::new();
        manager.add(Entity::car(0, -300, 1));
        let keep = manager.add(Entity::car(0, 100, 1));
        manager.add(Entity::car(0, 1000, 1));

        assert_eq!(manager.cleanup_offscreen(-200, 800), 2);
        assert_eq!(manager.len(), 1);
        assert!(manager.get(keep).is_some());
    }

    #[test]
    fn test_increase_speed_k_times() {
        let mut manager = MovingObstacleManager::new();
        let ids = manager.add_all([
            Entity::car(0, 0, 2),
            Entity::car(0, 100, -3),
            Entity::train(0, 200, 5),
        ]);
        let before: Vec<i32> = ids.iter().map(|id| manager.get(*id).unwrap().speed()).collect();

        let (k, f) = (4, 2);
        for _ in 0..k {
            manager.increase_speed(f);
        }

        for (id, old) in ids.iter().zip(before) {
            let new = manager.get(*id).unwrap().speed();
            assert_eq!(new.signum(), old.signum());
            assert_eq!(new.abs(), old.abs() + k * f);
        }
    }

    #[test]
    fn test_by_kind_and_reset() {
        let mut manager = MovingObstacleManager::new();
        let car = manager.add(Entity::car(10, 0, 2));
        manager.add(Entity::train(10, 100, 4));
        assert_eq!(manager.obstacles_by_kind(ObstacleKind::Car).len(), 1);
        assert_eq!(manager.obstacles_by_kind(ObstacleKind::Tree).len(), 0);

        manager.increase_speed(1);
        manager.update_all(800);
        manager.reset_all();
        let restored = manager.get(car).unwrap();
        assert_eq!((restored.x(), restored.speed()), (10, 2));
    }

    #[test]
    fn test_fast_car_slows_behind_slow_car() {
        let mut manager = MovingObstacleManager::new();
        let slow = manager.add(Entity::car(100, 40, 1));
        let fast = manager.add(Entity::car(60, 40, 3));
        manager.update_all(800);

        assert_eq!(manager.get(fast).unwrap().speed(), 1);
        assert_eq!(manager.get(slow).unwrap().speed(), 1);
    }

    #[test]
    fn test_opposing_cars_keep_speed() {
        let mut manager = MovingObstacleManager::new();
        let a = manager.add(Entity::car(100, 40, 1));
        let b = manager.add(Entity::car(120, 40, -3));
        manager.update_all(800);

        assert_eq!(manager.get(a).unwrap().speed(), 1);
        assert_eq!(manager.get(b).unwrap().speed(), -3);
    }
}
