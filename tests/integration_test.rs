//! Integration tests for transmit → receive round trips

use rand::rngs::StdRng;
use rand::SeedableRng;
use bitvec::prelude::*;
use rustywifi::crc::append_fcs;
use rustywifi::fec::ConvolutionalCode;
use rustywifi::interleaver::Interleaver;
use rustywifi::plcp::build_field;
use rustywifi::qam::Complex64;
use rustywifi::rate::Rate;
use rustywifi::scrambler::{scramble, Padding, DATA_SEED, HEADER_SEED};
use rustywifi::simulation::{add_awgn, pad, Channel};
use rustywifi::training::TrainingConfig;
use rustywifi::transmit::{HEADER_RATE, SERVICE_BITS};
use rustywifi::util::{bits_from_octets, Bits};
use rustywifi::{decode, Receiver, Transmitter};

use test_utils::{framed, init_test_tracing, random_payload, GUARD};

#[test]
fn test_round_trip_all_rates() {
    init_test_tracing();
    let tx = Transmitter::default();
    let rx = Receiver::default();
    // noiseless timing lands on the earliest offset of the search
    let early = TrainingConfig::default().timing_search;

    for rate in 0..tx.rates().len() {
        for (i, len) in [1usize, 50, 255, 4095].into_iter().enumerate() {
            let payload = random_payload(len, (rate * 10 + i) as u64);
            let samples = framed(&tx, &payload, rate);
            let frames = rx.decode(&samples);

            assert_eq!(frames.len(), 1, "rate {} length {}", rate, len);
            assert_eq!(frames[0].payload, payload, "rate {} length {}", rate, len);
            assert_eq!(frames[0].start, GUARD);
            assert_eq!(frames[0].end, samples.len() - GUARD - early);
        }
    }
}

#[test]
fn test_empty_payload() {
    let samples = framed(&Transmitter::default(), &[], 3);
    let frames = decode(&samples);
    assert_eq!(frames.len(), 1);
    assert!(frames[0].payload.is_empty());
}

/// Coding chain from bits to rows of data subcarriers, built from the public
/// stages so a test can tamper with the bits in between
fn grid(bits: &BitSlice<u8, Lsb0>, rate: &Rate, seed: u8, num_data: usize) -> Vec<Vec<Complex64>> {
    let scrambled = scramble(bits, Padding::Symbol(rate.data_bits_per_symbol), seed);
    let coded = ConvolutionalCode::default().encode(&scrambled);
    let punctured = rate.puncturing_mask().puncture(&coded);
    let interleaved = Interleaver::new(rate.coded_bits_per_symbol, rate.bits_per_subcarrier).apply_bits(&punctured, false);
    rate.constellation()
        .map_bits(&interleaved)
        .chunks(num_data)
        .map(|row| row.to_vec())
        .collect()
}

#[test]
fn test_single_bit_flip_fails_frame_check() {
    init_test_tracing();
    let tx = Transmitter::default();
    let format = tx.format();
    let rate_index = 3;
    let payload = random_payload(64, 21);

    let build = |flip: Option<usize>| {
        let mut body = bits_from_octets(&payload);
        append_fcs(&mut body);
        if let Some(bit) = flip {
            let value = !body[bit];
            body.set(bit, value);
        }
        let mut data: Bits = bitvec![u8, Lsb0; 0; SERVICE_BITS];
        data.extend_from_bitslice(&body);

        let header = build_field(tx.rates(), rate_index, payload.len());
        let header_grid = grid(&header, tx.rates().get(HEADER_RATE), HEADER_SEED, format.num_data());
        let data_grid = grid(&data, tx.rates().get(rate_index), DATA_SEED, format.num_data());
        pad(&format.encode(&header_grid, &data_grid), GUARD, GUARD)
    };

    // the untampered chain matches the transmitter exactly
    assert_eq!(build(None), framed(&tx, &payload, rate_index));
    for bit in [0usize, 7, 100, 8 * 64 - 1] {
        assert!(decode(&build(Some(bit))).is_empty(), "flip at payload bit {}", bit);
    }
}

#[test]
fn test_spliced_symbol_fails_frame_check() {
    init_test_tracing();
    let tx = Transmitter::default();
    let format = tx.format().clone();
    let payload = random_payload(100, 1);
    let other: Vec<u8> = payload.iter().map(|b| b ^ 0xFF).collect();

    // same rate and length, so the SIGNAL field and pilots match
    let mut waveform = tx.encode(&payload, 7);
    let donor = tx.encode(&other, 7);
    let start = format.preamble_len() + 2 * format.symbol_len();
    let end = start + format.symbol_len();
    waveform[start..end].copy_from_slice(&donor[start..end]);

    assert!(decode(&pad(&waveform, GUARD, GUARD)).is_empty());
    assert_eq!(decode(&pad(&tx.encode(&payload, 7), GUARD, GUARD))[0].payload, payload);
}

#[test]
fn test_noisy_channel_with_carrier_offset() {
    init_test_tracing();
    let tx = Transmitter::default();
    let rx = Receiver::default();
    let payload = random_payload(100, 99);

    for (seed, cfo_hz) in [(1u64, 50e3), (2, -80e3), (3, 12.5e3)] {
        let channel = Channel {
            snr_db: Some(25.0),
            cfo_hz,
            delay: GUARD,
            trailing: GUARD,
            seed,
        };
        let samples = channel.apply(&tx.encode(&payload, 0), tx.format().fs);
        let frames = rx.decode(&samples);
        assert_eq!(frames.len(), 1, "cfo {}", cfo_hz);
        assert_eq!(frames[0].payload, payload);
        assert!(frames[0].snr_db > 15.0, "snr estimate {}", frames[0].snr_db);
    }
}

#[test]
fn test_noisy_channel_qam_rates() {
    init_test_tracing();
    let tx = Transmitter::default();
    let rx = Receiver::default();
    let early = TrainingConfig::default().timing_search;

    // 16-QAM 1/2, 16-QAM 3/4, 64-QAM 2/3, 64-QAM 3/4
    for (rate, snr_db) in [(4usize, 22.0), (5, 24.0), (6, 30.0), (7, 32.0)] {
        let payload = random_payload(150, 40 + rate as u64);
        let waveform = tx.encode(&payload, rate);
        for (seed, cfo_hz) in [(7u64, 20e3), (8, -35e3), (9, 60e3)] {
            let channel = Channel {
                snr_db: Some(snr_db),
                cfo_hz,
                delay: GUARD,
                trailing: GUARD,
                seed,
            };
            let samples = channel.apply(&waveform, tx.format().fs);
            let frames = rx.decode(&samples);
            assert_eq!(frames.len(), 1, "rate {} seed {}", rate, seed);
            assert_eq!(frames[0].payload, payload, "rate {} seed {}", rate, seed);
            let end = GUARD + waveform.len();
            assert!(
                (end - early..=end).contains(&frames[0].end),
                "rate {} seed {} end {}",
                rate,
                seed,
                frames[0].end
            );
        }
    }
}

#[test]
fn test_back_to_back_frames() {
    init_test_tracing();
    let tx = Transmitter::default();
    let first = random_payload(60, 5);
    let second = random_payload(200, 6);

    let mut waveform = tx.encode(&first, 2);
    let boundary = waveform.len();
    waveform.extend(tx.encode(&second, 5));
    let samples = pad(&waveform, GUARD, GUARD);

    let frames = decode(&samples);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].payload, first);
    assert_eq!(frames[1].payload, second);
    assert_eq!(frames[0].end, GUARD + boundary - TrainingConfig::default().timing_search);
    assert_eq!(frames[1].start, GUARD + boundary);
}

#[test]
fn test_decode_batch() {
    let tx = Transmitter::default();
    let rx = Receiver::default();
    let payloads: Vec<Vec<u8>> = (0..4).map(|i| random_payload(30 + 10 * i, i as u64)).collect();
    let buffers: Vec<_> = payloads
        .iter()
        .enumerate()
        .map(|(i, payload)| framed(&tx, payload, 2 * i))
        .collect();

    let results = rx.decode_batch(&buffers);
    assert_eq!(results.len(), 4);
    for (frames, payload) in results.iter().zip(payloads.iter()) {
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0].payload, payload);
    }
}

#[test]
fn test_noise_only_buffer() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut samples = vec![Complex64::new(0.0, 0.0); 4000];
    add_awgn(&mut samples, 1.0, &mut rng);
    assert!(decode(&samples).is_empty());
}
