use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use fishbones::camera::PerspectiveCamera;
use fishbones::scene::{
    AnimationMixer, Channel, Clip, Interpolation, MeshPrimitive, Node, NodeId, SceneGraph, Skin, Track,
    Transform,
};
use fishbones::tracking::{HeadTracker, PointerSample, SolverParams, DEFAULT_ALPHA};
use glam::{Mat4, Quat, Vec3};

/// Chain of `bones` nodes, each 0.1 above its parent, with the last named "Head"
fn spine(bones: usize) -> SceneGraph {
    let nodes = (0..bones)
        .map(|i| {
            let name = if i + 1 == bones { "Head".to_string() } else { format!("Bone{}", i) };
            Node::new(name, Transform::from_translation(Vec3::new(0.0, 0.1, 0.0)))
        })
        .collect();
    let links: Vec<(usize, usize)> = (1..bones).map(|i| (i - 1, i)).collect();
    SceneGraph::new(nodes, &links)
}

fn swim_clip(bones: usize) -> Clip {
    let channels = (0..bones)
        .map(|i| {
            let mut channel = Channel::new(NodeId(i));
            channel.rotation = Some(Track::new(
                Interpolation::Linear,
                vec![0.0, 0.5, 1.0],
                vec![Quat::IDENTITY, Quat::from_rotation_z(0.3), Quat::IDENTITY],
            ));
            channel
        })
        .collect();
    Clip::new("Swim", channels)
}

/// Flat ribbon of `vertices` vertices spread along the chain
fn ribbon(bones: usize, vertices: usize) -> (MeshPrimitive, Skin) {
    let positions: Vec<Vec3> = (0..vertices)
        .map(|i| Vec3::new((i % 2) as f32, i as f32 * 0.1 * bones as f32 / vertices as f32, 0.0))
        .collect();
    let joints = (0..vertices)
        .map(|i| {
            let joint = (i * bones / vertices) as u16;
            [joint, joint.saturating_sub(1), 0, 0]
        })
        .collect();
    let indices = (0..vertices.saturating_sub(2) as u32)
        .flat_map(|i| [i, i + 1, i + 2])
        .collect();

    let primitive = MeshPrimitive {
        node: NodeId(0),
        skin: Some(0),
        material: None,
        normals: vec![Vec3::Z; vertices],
        positions,
        joints,
        weights: vec![[0.7, 0.3, 0.0, 0.0]; vertices],
        indices,
    };
    let skin = Skin {
        joints: (0..bones).map(NodeId).collect(),
        inverse_bind: vec![Mat4::IDENTITY; bones],
    };
    (primitive, skin)
}

fn bench_tracking_frame(c: &mut Criterion) {
    let mut camera = PerspectiveCamera::new(35.0, 16.0 / 9.0, 1.0, 500.0);
    camera.position = Vec3::new(0.0, 0.0, 5.0);

    let mut graph = spine(24);
    let mut tracker = HeadTracker::new("Head", DEFAULT_ALPHA, SolverParams::default());
    tracker.bind(&graph);

    c.bench_function("track_and_orient", |b| {
        let mut frame = 0u32;
        b.iter(|| {
            frame = frame.wrapping_add(1);
            let x = ((frame % 200) as f32 / 100.0) - 1.0;
            tracker.track(&camera, black_box(PointerSample { x, y: -x * 0.5 }));
            let pitch = tracker.orient(&mut graph);
            graph.update_world(Mat4::IDENTITY);
            black_box(pitch)
        })
    });
}

fn bench_mixer(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer_update");
    for bones in [8, 32, 128] {
        let mut graph = spine(bones);
        let mut mixer = AnimationMixer::new().with_max_delta(Some(1.0 / 30.0));
        mixer.play(swim_clip(bones));

        group.bench_with_input(BenchmarkId::from_parameter(bones), &bones, |b, _| {
            b.iter(|| {
                mixer.update(black_box(1.0 / 60.0), &mut graph);
                graph.update_world(Mat4::IDENTITY);
            })
        });
    }
    group.finish();
}

fn bench_skinning(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_skinning");
    let graph = spine(32);
    for vertices in [1_000, 10_000, 50_000] {
        let (primitive, skin) = ribbon(32, vertices);
        let skins = [skin];
        group.bench_with_input(BenchmarkId::from_parameter(vertices), &vertices, |b, _| {
            b.iter(|| black_box(primitive.deform(&graph, &skins)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tracking_frame, bench_mixer, bench_skinning);
criterion_main!(benches);
