use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use block_puzzle::core::{
    all_rotations, find_first_valid_position, Board, GameSession, Grid, PieceGenerator,
    PieceInstance, SessionRecord, ShapeKind, SlotSet,
};
use block_puzzle::types::{Position, GRID_SIZE, SLOT_COUNT};

fn bench_generate_empty(c: &mut Criterion) {
    let board = Board::new();
    let generator = PieceGenerator::new();
    let mut rng = ChaCha8Rng::seed_from_u64(12345);

    c.bench_function("generate_round_empty", |b| {
        b.iter(|| generator.generate(black_box(SLOT_COUNT), &board, &mut rng))
    });
}

fn bench_generate_full(c: &mut Criterion) {
    // Worst case: every draw fails, so each piece burns the whole attempt budget.
    let board = Board::from_grid(Grid::from_rows([[1u8; GRID_SIZE]; GRID_SIZE]));
    let generator = PieceGenerator::new();
    let mut rng = ChaCha8Rng::seed_from_u64(12345);

    c.bench_function("generate_round_full", |b| {
        b.iter(|| generator.generate(black_box(SLOT_COUNT), &board, &mut rng))
    });
}

fn bench_place_and_clear(c: &mut Criterion) {
    let mut rows = [[0u8; GRID_SIZE]; GRID_SIZE];
    rows[3][..7].fill(1);
    let board = Board::from_grid(Grid::from_rows(rows));
    let service = GameSession::default();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let slots = SlotSet::from_pieces(
        [ShapeKind::I1, ShapeKind::T, ShapeKind::Z].map(|k| PieceInstance::new(k.shape(), &mut rng)),
    );
    let record = SessionRecord::from_parts(board, 0, slots);
    let i1 = ShapeKind::I1.shape();

    c.bench_function("place_and_clear_row", |b| {
        b.iter(|| {
            let mut record = record.clone();
            service.place_piece(&mut record, &i1, black_box(Position::new(3, 7)))
        })
    });
}

fn bench_first_fit(c: &mut Criterion) {
    let mut rows = [[1u8; GRID_SIZE]; GRID_SIZE];
    rows[7][5..].fill(0);
    let grid = Grid::from_rows(rows);
    let i3 = ShapeKind::I3.shape();

    c.bench_function("first_fit_scan", |b| {
        b.iter(|| find_first_valid_position(black_box(&grid), &i3))
    });
}

fn bench_rotations(c: &mut Criterion) {
    let shape = ShapeKind::LLarge.shape();

    c.bench_function("all_rotations", |b| b.iter(|| all_rotations(black_box(&shape))));
}

criterion_group!(
    benches,
    bench_generate_empty,
    bench_generate_full,
    bench_place_and_clear,
    bench_first_fit,
    bench_rotations
);
criterion_main!(benches);
