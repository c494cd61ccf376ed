use datadog_protos::sketches::{index_mapping::Interpolation, DDSketch, IndexMapping as ProtoIndexMapping, Store};
use ddsketch_gk::mapping::IndexMapping;
use protobuf::{EnumOrUnknown, Message as _, MessageField};
use rand::SeedableRng;
use rand_distr::{Distribution, Pareto};

pub const GAMMA: f64 = 1.02;

pub fn proto_mapping(interpolation: Interpolation) -> ProtoIndexMapping {
    let mut mapping = ProtoIndexMapping::new();
    mapping.gamma = GAMMA;
    mapping.interpolation = EnumOrUnknown::new(interpolation);
    mapping
}

pub fn sketch_proto(interpolation: Interpolation, zero_count: f64, offset: i32, bins: &[f64]) -> DDSketch {
    let mut positive = Store::new();
    positive.contiguousBinCounts = bins.to_vec();
    positive.contiguousBinIndexOffset = offset;

    let mut sketch = DDSketch::new();
    sketch.mapping = MessageField::some(proto_mapping(interpolation));
    sketch.positiveValues = MessageField::some(positive);
    sketch.zeroCount = zero_count;
    sketch
}

pub fn encode(sketch: &DDSketch) -> Vec<u8> {
    sketch.write_to_bytes().expect("sketch should encode")
}

/// Encodes a logarithmic-mapping sketch with the given zero count and contiguous bins.
pub fn encode_bins(zero_count: u64, offset: i32, bins: &[u64]) -> Vec<u8> {
    let bins = bins.iter().map(|&count| count as f64).collect::<Vec<_>>();
    encode(&sketch_proto(Interpolation::NONE, zero_count as f64, offset, &bins))
}

/// Bins the given non-negative values with `mapping` and encodes them as a sketch.
pub fn encode_values(mapping: &IndexMapping, values: &[f64]) -> Vec<u8> {
    let mut zero_count = 0.0;
    let mut indexes = Vec::with_capacity(values.len());
    for &value in values {
        if value == 0.0 {
            zero_count += 1.0;
        } else {
            indexes.push(mapping.index(value));
        }
    }

    let mut sketch = DDSketch::new();
    sketch.mapping = MessageField::some(mapping.to_proto());
    sketch.zeroCount = zero_count;

    if let (Some(&low), Some(&high)) = (indexes.iter().min(), indexes.iter().max()) {
        let mut bins = vec![0.0; (high - low) as usize + 1];
        for index in indexes {
            bins[(index - low) as usize] += 1.0;
        }

        let mut positive = Store::new();
        positive.contiguousBinCounts = bins;
        positive.contiguousBinIndexOffset = low;
        sketch.positiveValues = MessageField::some(positive);
    }

    encode(&sketch)
}

/// Returns the value every observation is represented by once binned with `mapping`, in ascending order.
pub fn represented_values(mapping: &IndexMapping, values: &[f64]) -> Vec<f64> {
    let mut represented = values
        .iter()
        .map(|&value| if value == 0.0 { 0.0 } else { mapping.value(mapping.index(value)) })
        .collect::<Vec<_>>();
    represented.sort_by(f64::total_cmp);
    represented
}

pub fn make_points(size: usize, seed: u64) -> Vec<f64> {
    // Latencies of a typical web service, in microseconds: a big hump at the beginning with a long tail, bottoming
    // out at 15 milliseconds and tailing off up to 10 seconds.
    let distribution = Pareto::new(1.0, 1.0).expect("pareto distribution should be valid");

    let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
    distribution
        .sample_iter(&mut rng)
        // Scale by 10,000 to get microseconds.
        .map(|n| n * 10_000.0)
        .filter(|n| *n > 15_000.0 && *n < 10_000_000.0)
        .take(size)
        .collect::<Vec<_>>()
}
