use serde::Serialize;

use super::models::AdminGiftCode;
use crate::domains::admin_users::AdminUser;

/// The part of a gifter's profile a recipient gets to see
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GifterCard {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
}

/// Build the card from the gifter's profile, keeping only what the gift code
/// discloses. The name falls back to the display name.
pub fn gifter_card(gifter: &AdminUser, gift: &AdminGiftCode) -> GifterCard {
    let reveal = |show: bool, value: &Option<String>| if show { value.clone() } else { None };

    GifterCard {
        name: gift
            .show_name
            .then(|| {
                gifter
                    .full_name
                    .clone()
                    .unwrap_or_else(|| gifter.display_name.clone())
            }),
        email: gift.show_email.then(|| gifter.email.clone()),
        phone: reveal(gift.show_phone, &gifter.phone),
        bio: reveal(gift.show_bio, &gifter.bio),
        avatar_url: reveal(gift.show_avatar, &gifter.avatar_url),
        website: reveal(gift.show_website, &gifter.website),
    }
}
