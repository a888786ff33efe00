//! The courtyard level: four 20 m rooms around a square, one of them a
//! gated cellar.
//!
//! ```text
//!   z=40 +-----------+-----------+
//!        |  Cellar   |  Kitchen  |
//!        |  (gated)  |           |
//!   z=20 +-----------+-----------+
//!        | Courtyard |   Hall    |
//!        |     o     |           |
//!   z=0  +-----------+-----------+
//!        x=0        x=20        x=40
//! ```

use anyhow::Result;

use hz_core::{SimRng, Vec3};
use hz_sim::{FlatWorld, SurvivorSpawn};
use hz_spatial::{Aabb, PartitionGraph};

const ROOM:       f32 = 20.0;
const CEILING:    f32 = 6.0;
const TARGET:     u32 = 4;
/// Offset of the two spawners from each room's center.
const SPAWN_AT:   f32 = 6.0;
const SPAWN_SIZE: Vec3 = Vec3::new(1.5, 0.0, 1.5);

struct Room {
    name:  &'static str,
    col:   u8,
    row:   u8,
    gated: bool,
}

const ROOMS: [Room; 4] = [
    Room { name: "Courtyard", col: 0, row: 0, gated: false },
    Room { name: "Hall",      col: 1, row: 0, gated: false },
    Room { name: "Kitchen",   col: 1, row: 1, gated: false },
    Room { name: "Cellar",    col: 0, row: 1, gated: true },
];

fn room_min(room: &Room) -> Vec3 {
    Vec3::new(f32::from(room.col) * ROOM, 0.0, f32::from(room.row) * ROOM)
}

pub fn world() -> FlatWorld {
    FlatWorld::new(0.0)
        .with_floor(Aabb::new(Vec3::ZERO, Vec3::new(2.0 * ROOM, 0.0, 2.0 * ROOM)))
        // Fountain in the courtyard.
        .with_obstacle(Aabb::new(Vec3::new(9.0, 0.0, 9.0), Vec3::new(11.0, 1.2, 11.0)), false)
        // Counter in the kitchen; low enough to vault.
        .with_obstacle(Aabb::new(Vec3::new(26.0, 0.0, 29.0), Vec3::new(34.0, 0.3, 31.0)), true)
}

pub fn graph(seed: u64) -> Result<PartitionGraph> {
    let mut graph = PartitionGraph::new(SimRng::new(seed).child(0x1e7e1));
    let mut ids = Vec::with_capacity(ROOMS.len());
    for room in &ROOMS {
        let min = room_min(room);
        let bounds = Aabb::new(min - Vec3::Y, min + Vec3::new(ROOM, CEILING, ROOM));
        let id = graph.add_partition(room.name, bounds, TARGET);
        graph.set_gated(id, room.gated)?;
        let center = bounds.center().with_y(0.0);
        for dx in [-SPAWN_AT, SPAWN_AT] {
            graph.add_spawner(id, Aabb::from_center(center + Vec3::new(dx, 0.0, dx), SPAWN_SIZE))?;
        }
        ids.push(id);
    }
    // Around the square.
    for i in 0..ids.len() {
        graph.connect(ids[i], ids[(i + 1) % ids.len()])?;
    }
    Ok(graph)
}

/// One survivor patrolling courtyard, hall, and kitchen; one holding the
/// courtyard's west wall.
pub fn survivors() -> Vec<SurvivorSpawn> {
    vec![
        SurvivorSpawn::walking(Vec3::new(5.0, 0.0, 5.0), vec![
            Vec3::new(30.0, 0.0, 5.0),
            Vec3::new(30.0, 0.0, 35.0),
            Vec3::new(30.0, 0.0, 5.0),
            Vec3::new(5.0, 0.0, 5.0),
        ]),
        SurvivorSpawn::standing(Vec3::new(2.0, 0.0, 15.0)),
    ]
}
