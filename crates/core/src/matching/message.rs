//! Tone-specific gift messages rendered with Tera.

use rand::Rng;
use tera::{Context, Tera};

use crate::domain::product::Product;
use crate::domain::profile::RecipientProfile;
use crate::domain::vocabulary::Tone;

/// One template per line.
const FUNNY: &str = include_str!("../../../../templates/messages/funny.txt.tera");
const ROMANTIC: &str = include_str!("../../../../templates/messages/romantic.txt.tera");
const SINCERE: &str = include_str!("../../../../templates/messages/sincere.txt.tera");
const CASUAL: &str = include_str!("../../../../templates/messages/casual.txt.tera");

/// Compiled template bank, keyed `<tone>/<index>`.
#[derive(Debug, Clone)]
pub struct MessageSynthesizer {
    tera: Tera,
    counts: [usize; 4],
}

impl MessageSynthesizer {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        let mut counts = [0; 4];

        for (slot, tone) in Tone::ALL.iter().enumerate() {
            let lines = bank_source(*tone).lines().map(str::trim).filter(|line| !line.is_empty());
            for (index, line) in lines.enumerate() {
                tera.add_raw_template(&template_name(*tone, index), line)?;
                counts[slot] += 1;
            }
            if counts[slot] == 0 {
                return Err(tera::Error::msg(format!(
                    "message bank for tone `{}` is empty",
                    tone.label()
                )));
            }
        }

        Ok(Self { tera, counts })
    }

    pub fn template_count(&self, tone: Tone) -> usize {
        self.counts[tone_slot(tone)]
    }

    /// Picks a template for the profile's tone uniformly at random and renders it.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        profile: &RecipientProfile,
        product: &Product,
        rng: &mut R,
    ) -> Result<String, tera::Error> {
        let tone = profile.tone();
        let index = rng.gen_range(0..self.template_count(tone));

        let mut context = Context::new();
        context.insert("recipient_name", &profile.display_name());
        context.insert("occasion", profile.occasion().label());
        context.insert("relationship", &profile.relationship().label().to_lowercase());
        context.insert("product", &product.title.to_lowercase());

        self.tera.render(&template_name(tone, index), &context)
    }
}

fn bank_source(tone: Tone) -> &'static str {
    match tone {
        Tone::Funny => FUNNY,
        Tone::Romantic => ROMANTIC,
        Tone::Sincere => SINCERE,
        Tone::Casual => CASUAL,
    }
}

fn tone_slot(tone: Tone) -> usize {
    match tone {
        Tone::Funny => 0,
        Tone::Romantic => 1,
        Tone::Sincere => 2,
        Tone::Casual => 3,
    }
}

fn template_name(tone: Tone, index: usize) -> String {
    format!("{}/{index}", tone.label().to_lowercase())
}
