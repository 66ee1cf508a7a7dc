use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use syndicate_core::models::{Platform, PublishJob};
use syndicate_core::orchestration::{effective_times, PublishStatus};
use syndicate_core::state_machine::SlotState;
use syndicate_core::PublishingConfig;

fn sample_job() -> PublishJob {
    let now = Utc::now();
    let mut job = PublishJob::new(1, 1, Platform::ALL.to_vec(), None, None, now, now);
    let states = [
        SlotState::Success,
        SlotState::Failed,
        SlotState::Publishing,
        SlotState::Pending,
    ];
    for (slot, state) in job.slots.values_mut().zip(states.iter().cycle()) {
        slot.status = *state;
    }
    job
}

fn benchmark_status_aggregation(c: &mut Criterion) {
    let job = sample_job();
    let window = PublishingConfig::default().estimated_completion_window();
    c.bench_function("publish_status_from_job", |b| {
        b.iter(|| PublishStatus::from_job(black_box(&job), window))
    });
}

fn benchmark_batch_stagger(c: &mut Criterion) {
    let base = Utc::now();
    c.bench_function("effective_times_100", |b| {
        b.iter(|| effective_times(black_box(base), 100, Some(10)).unwrap_or_default())
    });
}

criterion_group!(benches, benchmark_status_aggregation, benchmark_batch_stagger);
criterion_main!(benches);
