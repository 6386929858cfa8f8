use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fusion_runtime::{
    AccelChannel, BoardHal, CalibrationSuite, ControlSubsystem, Features, FusionContext,
    FusionEngine, FusionHandles, GyroChannel, MagChannel, SampleBanks, SensorDriver, SensorError,
    Status, StatusSubsystem, condition_sample,
};
use rand::prelude::*;
use rand_pcg::Pcg64;

// Pre-generated sensor data to eliminate RNG overhead during benchmarks
struct PreGeneratedData {
    samples: Vec<[i16; 3]>,
    index: usize,
}

impl PreGeneratedData {
    fn new(count: usize, seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let samples = (0..count)
            .map(|_| {
                [
                    rng.random_range(-2048..2048),
                    rng.random_range(-2048..2048),
                    rng.random_range(1800..2200),
                ]
            })
            .collect();

        Self { samples, index: 0 }
    }

    fn next(&mut self) -> [i16; 3] {
        let sample = self.samples[self.index];
        self.index = (self.index + 1) % self.samples.len();
        sample
    }
}

#[derive(Default)]
struct TwoSlotStatus {
    current: Status,
    queued: Status,
}

impl StatusSubsystem for TwoSlotStatus {
    fn set(&mut self, status: Status) {
        self.current = status;
        self.queued = status;
    }

    fn get(&self) -> Status {
        self.current
    }

    fn queue(&mut self, status: Status) {
        self.queued = status;
    }

    fn update(&mut self) {
        self.current = self.queued;
    }

    fn test(&mut self) {}
}

struct QuietBoard;

impl BoardHal for QuietBoard {
    fn initialize_bus(&mut self, _sda_pin: u32, _scl_pin: u32) -> bool {
        true
    }

    fn correct_accel(&mut self, _accel: &mut AccelChannel) {}

    fn correct_mag(&mut self, _mag: &mut MagChannel) {}

    fn correct_gyro(&mut self, _gyro: &mut GyroChannel) {}
}

struct PassthroughCal;

impl CalibrationSuite for PassthroughCal {
    fn initialize_accel(&mut self, _packet_on: &mut bool) {}

    fn initialize_mag(&mut self) {}

    fn invert_accel(&mut self, accel: &mut AccelChannel) {
        accel.calibrated_g = accel.average_g;
        accel.calibrated_counts = accel.raw_average;
    }

    fn update_accel_history(&mut self, _accel: &AccelChannel, _packet_on: &mut bool) {}

    fn invert_mag(&mut self, mag: &mut MagChannel) {
        mag.calibrated_ut = mag.average_ut;
        mag.calibrated_counts = mag.raw_average;
    }

    fn mag_history_read_only(&self) -> bool {
        false
    }

    fn update_mag_history(&mut self, _mag: &MagChannel, _cycle: u32) {}

    fn refine_mag(&mut self, _mag: &mut MagChannel, _cycle: u32) {}
}

struct NullEngine;

impl FusionEngine for NullEngine {
    fn initialize(&mut self, _handles: FusionHandles<'_>) {}

    fn fuse(&mut self, _handles: FusionHandles<'_>) {}
}

/// Driver replaying pre-generated samples into every present channel.
struct ReplayDriver {
    data: PreGeneratedData,
    samples_per_cycle: usize,
}

impl SensorDriver for ReplayDriver {
    fn initialize(&mut self, _addr: u16, banks: &mut SampleBanks) -> Result<(), SensorError> {
        if let Some(accel) = banks.accel.as_mut() {
            accel.g_per_count = 0.000488;
        }
        if let Some(mag) = banks.mag.as_mut() {
            mag.ut_per_count = 0.1;
        }
        if let Some(gyro) = banks.gyro.as_mut() {
            gyro.dps_per_count = 0.0625;
        }
        Ok(())
    }

    fn read(&mut self, _addr: u16, banks: &mut SampleBanks) -> Result<(), SensorError> {
        for _ in 0..self.samples_per_cycle {
            let mut sample = self.data.next();
            condition_sample(&mut sample);
            if let Some(accel) = banks.accel.as_mut() {
                accel.fifo.push(sample);
            }
            if let Some(mag) = banks.mag.as_mut() {
                mag.fifo.push(sample);
            }
            if let Some(gyro) = banks.gyro.as_mut() {
                gyro.fifo.push(sample);
            }
        }
        Ok(())
    }
}

/// Benchmark a complete read/condition/fuse cycle with all features on
fn bench_full_cycle(c: &mut Criterion) {
    let mut status = TwoSlotStatus::default();
    let mut control = ControlSubsystem::default();
    let mut driver = ReplayDriver {
        data: PreGeneratedData::new(4096, 42),
        samples_per_cycle: 8,
    };
    let mut board = QuietBoard;
    let mut cal = PassthroughCal;
    let mut engine = NullEngine;

    let mut ctx = FusionContext::new(Features::ALL, &mut status, &mut control);
    ctx.install_sensor(&mut driver, 0x1f, 1).unwrap();
    ctx.initialize(&mut engine, &mut board, &mut cal, 21, 22);

    c.bench_function("full_cycle_all_features", |b| {
        b.iter(|| {
            let cycle = ctx.cycle();
            let _ = black_box(ctx.read_sensors(cycle));
            ctx.condition_readings(&mut board, &mut cal);
            ctx.run_fusion(&mut engine);
            ctx.update_status();
        })
    });
}

/// Benchmark conditioning alone over a full accelerometer FIFO
fn bench_conditioning(c: &mut Criterion) {
    let mut status = TwoSlotStatus::default();
    let mut control = ControlSubsystem::default();
    let mut board = QuietBoard;
    let mut cal = PassthroughCal;
    let mut data = PreGeneratedData::new(4096, 7);

    let mut ctx = FusionContext::new(Features::ALL_SENSORS, &mut status, &mut control);

    c.bench_function("condition_full_fifos", |b| {
        b.iter(|| {
            {
                let banks = ctx.banks_mut();
                let accel = banks.accel.as_mut().unwrap();
                for _ in 0..accel.fifo.capacity() {
                    accel.fifo.push(data.next());
                }
                let gyro = banks.gyro.as_mut().unwrap();
                for _ in 0..gyro.fifo.capacity() {
                    gyro.fifo.push(data.next());
                }
            }
            ctx.condition_readings(&mut board, &mut cal);
            ctx.clear_fifos();
        })
    });
}

/// Benchmark the scheduler walking a fully populated registry
fn bench_read_sensors(c: &mut Criterion) {
    let mut status = TwoSlotStatus::default();
    let mut control = ControlSubsystem::default();
    let mut board = QuietBoard;
    let mut cal = PassthroughCal;
    let mut engine = NullEngine;

    let mut drivers: Vec<ReplayDriver> = (0..4u64)
        .map(|seed| ReplayDriver {
            data: PreGeneratedData::new(1024, seed),
            samples_per_cycle: 2,
        })
        .collect();

    let mut ctx = FusionContext::new(Features::ALL, &mut status, &mut control);
    for (i, driver) in drivers.iter_mut().enumerate() {
        ctx.install_sensor(driver, 0x10 + i as u16, 1 + i as u16)
            .unwrap();
    }
    ctx.initialize(&mut engine, &mut board, &mut cal, 21, 22);

    c.bench_function("read_sensors_four_schedules", |b| {
        b.iter(|| {
            let cycle = ctx.cycle();
            let _ = black_box(ctx.read_sensors(cycle));
            ctx.run_fusion(&mut engine);
        })
    });
}

criterion_group!(benches, bench_full_cycle, bench_conditioning, bench_read_sensors);

criterion_main!(benches);
