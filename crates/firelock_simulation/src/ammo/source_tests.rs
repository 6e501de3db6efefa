//! Tests for ammo source routing.

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;
    use bevy::prelude::*;

    use crate::ammo::source::{
        routed_do, routed_get, routed_set, AmmoContainerLink, AmmoSource, AmmoSourceConfig,
    };
    use crate::ammo::store::{AmmoId, AmmoStore, AMMO_INFINITE};

    fn bullets() -> AmmoId {
        AmmoId::new("Bullets")
    }

    #[test]
    fn test_local_routing_uses_own_store() {
        let mut world = World::new();
        let weapon = world.spawn(AmmoStore::with(bullets(), 6, 10)).id();
        let config = AmmoSourceConfig::new().with(bullets(), AmmoSource::Local);

        let applied = world
            .run_system_once(move |mut stores: Query<&mut AmmoStore>| {
                assert_eq!(routed_get(&mut stores, weapon, &config, None, &bullets()), 6);
                routed_do(&mut stores, weapon, &config, None, &bullets(), -2)
            })
            .unwrap();

        assert_eq!(applied, -2);
        assert_eq!(
            world.get::<AmmoStore>(weapon).unwrap().get_ammo(&bullets()),
            4
        );
    }

    #[test]
    fn test_container_routing_delegates_to_linked_entity() {
        let mut world = World::new();
        let container = world.spawn(AmmoStore::with(bullets(), 30, 50)).id();
        let weapon = world.spawn(AmmoStore::new()).id();
        let config = AmmoSourceConfig::new().with(bullets(), AmmoSource::Container);
        let link = AmmoContainerLink(Some(container));

        let applied = world
            .run_system_once(move |mut stores: Query<&mut AmmoStore>| {
                routed_do(&mut stores, weapon, &config, Some(&link), &bullets(), -10)
            })
            .unwrap();

        assert_eq!(applied, -10);
        assert_eq!(
            world
                .get::<AmmoStore>(container)
                .unwrap()
                .get_ammo(&bullets()),
            20
        );
        // Собственный store оружия не тронут
        assert_eq!(
            world.get::<AmmoStore>(weapon).unwrap().get_ammo(&bullets()),
            0
        );
    }

    #[test]
    fn test_container_link_resolved_fresh_per_call() {
        let mut world = World::new();
        let old_container = world.spawn(AmmoStore::with(bullets(), 5, 50)).id();
        let new_container = world.spawn(AmmoStore::with(bullets(), 40, 50)).id();
        let weapon = world.spawn(AmmoStore::new()).id();
        let config = AmmoSourceConfig::new().with(bullets(), AmmoSource::Container);

        let (first, second) = world
            .run_system_once(move |mut stores: Query<&mut AmmoStore>| {
                let first = routed_get(
                    &mut stores,
                    weapon,
                    &config,
                    Some(&AmmoContainerLink(Some(old_container))),
                    &bullets(),
                );
                // Оружие сменило контейнер между вызовами
                let second = routed_get(
                    &mut stores,
                    weapon,
                    &config,
                    Some(&AmmoContainerLink(Some(new_container))),
                    &bullets(),
                );
                (first, second)
            })
            .unwrap();

        assert_eq!(first, 5);
        assert_eq!(second, 40);
    }

    #[test]
    #[should_panic(expected = "no container is linked")]
    fn test_container_routing_without_link_is_fatal() {
        let mut world = World::new();
        let weapon = world.spawn(AmmoStore::new()).id();
        let config = AmmoSourceConfig::new().with(bullets(), AmmoSource::Container);

        let _ = world.run_system_once(move |mut stores: Query<&mut AmmoStore>| {
            routed_get(&mut stores, weapon, &config, None, &bullets())
        });
    }

    #[test]
    fn test_infinite_routing_never_touches_stores() {
        let mut world = World::new();
        let weapon = world.spawn(AmmoStore::with(bullets(), 3, 10)).id();
        let config = AmmoSourceConfig::new().with(bullets(), AmmoSource::Infinite);

        let (read, withdrawn) = world
            .run_system_once(move |mut stores: Query<&mut AmmoStore>| {
                let read = routed_get(&mut stores, weapon, &config, None, &bullets());
                let withdrawn = routed_do(&mut stores, weapon, &config, None, &bullets(), -4);
                (read, withdrawn)
            })
            .unwrap();

        assert_eq!(read, AMMO_INFINITE);
        assert_eq!(withdrawn, -4);
        // Local store остался как был
        assert_eq!(
            world.get::<AmmoStore>(weapon).unwrap().get_ammo(&bullets()),
            3
        );
    }

    #[test]
    fn test_infinite_set_is_clamped() {
        let mut world = World::new();
        let weapon = world.spawn(AmmoStore::new()).id();
        let config = AmmoSourceConfig::new().with(bullets(), AmmoSource::Infinite);

        let written = world
            .run_system_once(move |mut stores: Query<&mut AmmoStore>| {
                routed_set(&mut stores, weapon, &config, None, &bullets(), -7)
            })
            .unwrap();

        assert_eq!(written, 0);
    }
}
