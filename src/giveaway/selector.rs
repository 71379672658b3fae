use rand::seq::index;
use rand::Rng;

/// Draw `min(count, participants.len())` distinct entries uniformly at random.
///
/// Winners come back in join order so the announcement reads the same way
/// for a given draw regardless of the order the sampler produced them in.
pub fn select_winners<T, R>(participants: &[T], count: usize, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let amount = count.min(participants.len());
    if amount == 0 {
        return Vec::new();
    }

    let mut picked = index::sample(rng, participants.len(), amount).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| participants[i].clone()).collect()
}
