use criterion::{Criterion, criterion_group, criterion_main};
use ctrk::Decoder;
use std::hint::black_box;

fn time_field(ms_of_day: i64) -> [u8; 10] {
    let total_seconds = ms_of_day / 1000;
    let mut field = [0; 10];
    field[0..2].copy_from_slice(&((ms_of_day % 1000) as u16).to_le_bytes());
    field[2] = (total_seconds % 60) as u8;
    field[3] = (total_seconds / 60 % 60) as u8;
    field[4] = (total_seconds / 3600) as u8;
    field[6] = 1;
    field[7] = 1;
    field[8..10].copy_from_slice(&1970_u16.to_le_bytes());
    field
}

fn record(kind: u16, at: i64, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&kind.to_le_bytes());
    bytes.extend_from_slice(&((14 + payload.len()) as u16).to_le_bytes());
    bytes.extend_from_slice(&time_field(at));
    bytes.extend_from_slice(payload);
    bytes
}

/// A session of `n` records: mostly CAN traffic with a GPS fix every second.
fn synthetic(n: usize) -> Vec<u8> {
    let sentence = "$GPRMC,120000.00,A,0100.00000,N,00030.00000,E,10.0,90.0,010170,,,A*50";
    let can_ids: [u16; 4] = [0x0209, 0x0258, 0x0264, 0x023e];
    let mut data = vec![0; 0x34];
    data[0..4].copy_from_slice(b"HEAD");
    for i in 0..n {
        let at = i as i64 * 20;
        if i % 50 == 0 {
            data.extend(record(2, at, sentence.as_bytes()));
        } else {
            let mut payload = can_ids[i % can_ids.len()].to_le_bytes().to_vec();
            payload.extend_from_slice(&[0, 0, 8]);
            payload.extend_from_slice(&[0x20, 0x01, 0x04, 0x80, 0x02, 0, 0x75, 0x30]);
            data.extend(record(1, at, &payload));
        }
    }
    data.extend_from_slice(&[0; 14]);
    data
}

fn decode(c: &mut Criterion) {
    let data = synthetic(10_000);
    c.bench_function("decode_10k_records", |b| {
        b.iter(|| black_box(Decoder::new(&data).unwrap().decode()))
    });
}

criterion_group!(benches, decode);
criterion_main!(benches);
