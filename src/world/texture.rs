// Format-agnostic repository of pictures decoded by the asset loader.
// The renderer and world logic interact through ids only.

use std::collections::HashMap;

use std::ops::{Index, IndexMut};

use smallvec::SmallVec;

use crate::math::Fixed;

/// Runtime handle for a texture (walls, sky, sprite patches) in this bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;
pub type FlatId = u16;
pub type SpriteId = u16;

/// `TextureId` whose pixels are the checkerboard fallback.
/// Always = 0 because `TextureBank::new()` inserts it first. On a sidedef
/// it means "no texture on this tier".
pub const NO_TEXTURE: TextureId = 0;
pub const NO_FLAT: FlatId = 0;

/// Palette index treated as a hole when building posts.
pub const TRANSPARENT: u8 = 0;

pub const FLAT_SIZE: usize = 64;

/// Light-diminishing maps; followed by the inverse map and a black map.
pub const NUMCOLORMAPS: usize = 32;
pub const INVERSE_COLORMAP: u8 = 32;

/// Vertical run of opaque texels inside one texture column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Post {
    pub top: u16,
    pub len: u16,
}

/// CPU-side picture: palette indices in **column-major** order plus the
/// opaque runs of every column.
///
/// Wall textures are sampled as whole columns (wrapping vertically);
/// sprites and masked mid-textures only draw their posts.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub w: usize,
    pub h: usize,
    /// Sprite anchor: columns left of the origin.
    pub left_offset: i32,
    /// Sprite anchor: rows above the origin.
    pub top_offset: i32,
    pixels: Vec<u8>,
    posts: Vec<SmallVec<[Post; 2]>>,
}

/// Convenience checkerboard 8×8 (dark/light grey).
impl Default for Texture {
    fn default() -> Self {
        const LIGHT_IDX: u8 = 8;
        const DARK_IDX: u8 = 16;
        Texture::from_fn("CHECKER", 8, 8, |x, y| {
            if (x ^ y) & 1 == 0 { LIGHT_IDX } else { DARK_IDX }
        })
    }
}

impl Texture {
    /// Build a picture by sampling `texel(x, y)`; `TRANSPARENT` texels
    /// become holes.
    pub fn from_fn<S, F>(name: S, w: usize, h: usize, texel: F) -> Self
    where
        S: Into<String>,
        F: Fn(usize, usize) -> u8,
    {
        let (w, h) = (w.max(1), h.max(1));
        let mut pixels = Vec::with_capacity(w * h);
        for x in 0..w {
            for y in 0..h {
                pixels.push(texel(x, y));
            }
        }
        let posts = (0..w)
            .map(|x| collect_posts(&pixels[x * h..(x + 1) * h]))
            .collect();
        Texture {
            name: name.into(),
            w,
            h,
            left_offset: 0,
            top_offset: 0,
            pixels,
            posts,
        }
    }

    /// Build from row-major palette indices as a loader would hand them over.
    pub fn from_rows<S: Into<String>>(
        name: S,
        w: usize,
        h: usize,
        rows: &[u8],
    ) -> Result<Self, TextureError> {
        let name = name.into();
        if w == 0 || h == 0 || rows.len() != w * h {
            return Err(TextureError::BadSize {
                name,
                expected: w * h,
                got: rows.len(),
            });
        }
        Ok(Self::from_fn(name, w, h, |x, y| rows[y * w + x]))
    }

    pub fn with_offsets(mut self, left: i32, top: i32) -> Self {
        self.left_offset = left;
        self.top_offset = top;
        self
    }

    #[inline]
    pub fn height_fixed(&self) -> Fixed {
        Fixed::from_int(self.h as i32)
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[x * self.h + y]
    }

    /// Whole column `col`, wrapped horizontally.
    #[inline]
    pub fn column(&self, col: i32) -> &[u8] {
        let c = col.rem_euclid(self.w as i32) as usize;
        &self.pixels[c * self.h..(c + 1) * self.h]
    }

    /// Opaque runs of column `col`, wrapped horizontally.
    #[inline]
    pub fn posts(&self, col: i32) -> &[Post] {
        &self.posts[col.rem_euclid(self.w as i32) as usize]
    }

    /// Texels of one post of column `col`.
    #[inline]
    pub fn post_pixels(&self, col: i32, post: Post) -> &[u8] {
        let column = self.column(col);
        let top = post.top as usize;
        &column[top..top + post.len as usize]
    }

    /// True when at least one texel is a hole.
    pub fn is_masked(&self) -> bool {
        self.posts
            .iter()
            .any(|p| !(p.len() == 1 && p[0].top == 0 && p[0].len as usize == self.h))
    }
}

fn collect_posts(column: &[u8]) -> SmallVec<[Post; 2]> {
    let mut posts = SmallVec::new();
    let mut y = 0;
    while y < column.len() {
        if column[y] == TRANSPARENT {
            y += 1;
            continue;
        }
        let top = y;
        while y < column.len() && column[y] != TRANSPARENT {
            y += 1;
        }
        posts.push(Post {
            top: top as u16,
            len: (y - top) as u16,
        });
    }
    posts
}

/// 64×64 floor/ceiling picture, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Flat {
    pub name: String,
    pixels: Vec<u8>,
}

impl Default for Flat {
    fn default() -> Self {
        Flat::from_fn("CHECKER", |x, y| if ((x >> 3) ^ (y >> 3)) & 1 == 0 { 8 } else { 16 })
    }
}

impl Flat {
    pub fn from_fn<S, F>(name: S, texel: F) -> Self
    where
        S: Into<String>,
        F: Fn(usize, usize) -> u8,
    {
        let mut pixels = Vec::with_capacity(FLAT_SIZE * FLAT_SIZE);
        for y in 0..FLAT_SIZE {
            for x in 0..FLAT_SIZE {
                pixels.push(texel(x, y));
            }
        }
        Flat {
            name: name.into(),
            pixels,
        }
    }

    pub fn new<S: Into<String>>(name: S, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let name = name.into();
        if pixels.len() != FLAT_SIZE * FLAT_SIZE {
            return Err(TextureError::BadSize {
                name,
                expected: FLAT_SIZE * FLAT_SIZE,
                got: pixels.len(),
            });
        }
        Ok(Flat { name, pixels })
    }

    /// Texel at the packed `(v << 6) | u` spot the span drawer computes.
    #[inline(always)]
    pub fn spot(&self, spot: usize) -> u8 {
        self.pixels[spot & (FLAT_SIZE * FLAT_SIZE - 1)]
    }
}

/// One animation frame of a sprite: either one patch for every angle or
/// eight rotations, each optionally mirrored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteFrame {
    pub rotate: bool,
    pub patches: [TextureId; 8],
    pub flip: [bool; 8],
}

impl SpriteFrame {
    pub fn single(patch: TextureId) -> Self {
        Self {
            rotate: false,
            patches: [patch; 8],
            flip: [false; 8],
        }
    }

    /// Rotation 0 faces the viewer; rotations advance counter-clockwise
    /// around the object in 45° steps.
    pub fn rotated(patches: [TextureId; 8], flip: [bool; 8]) -> Self {
        Self {
            rotate: true,
            patches,
            flip,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpriteDef {
    pub name: String,
    pub frames: Vec<SpriteFrame>,
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    #[error("sprite id {0} out of range")]
    BadSprite(SpriteId),

    /// Pixel data does not match the declared dimensions.
    #[error("`{name}`: expected {expected} texels, got {got}")]
    BadSize {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// 256 colours, 0x00RRGGBB.
#[derive(Clone)]
pub struct Palette(pub [u32; 256]);
impl Default for Palette {
    fn default() -> Self {
        Palette([0u32; 256])
    }
}
impl Index<usize> for Palette {
    type Output = u32;
    fn index(&self, idx: usize) -> &u32 {
        &self.0[idx]
    }
}
impl IndexMut<usize> for Palette {
    fn index_mut(&mut self, idx: usize) -> &mut u32 {
        &mut self.0[idx]
    }
}
impl Palette {
    #[inline]
    pub fn rgb(&self, idx: usize) -> [i32; 3] {
        let c = self.0[idx];
        [(c >> 16 & 0xFF) as i32, (c >> 8 & 0xFF) as i32, (c & 0xFF) as i32]
    }

    /// Closest entry by squared RGB distance (lowest index on ties).
    pub fn nearest(&self, rgb: [i32; 3]) -> u8 {
        let mut best = 0;
        let mut best_d = i32::MAX;
        for i in 0..256 {
            let [r, g, b] = self.rgb(i);
            let d = (r - rgb[0]).pow(2) + (g - rgb[1]).pow(2) + (b - rgb[2]).pow(2);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best as u8
    }
}

/// Light-level remap tables: 32 diminishing maps, the inverse map and an
/// all-black map.
#[derive(Clone)]
pub struct Colormap(pub [[u8; 256]; 34]);
impl Default for Colormap {
    fn default() -> Self {
        Colormap([[0u8; 256]; 34])
    }
}
impl Index<usize> for Colormap {
    type Output = [u8; 256];
    fn index(&self, idx: usize) -> &Self::Output {
        &self.0[idx]
    }
}
impl IndexMut<usize> for Colormap {
    fn index_mut(&mut self, idx: usize) -> &mut [u8; 256] {
        &mut self.0[idx]
    }
}
impl Colormap {
    /// Every map passes indices through unchanged.
    pub fn identity() -> Self {
        let mut row = [0u8; 256];
        for (i, v) in row.iter_mut().enumerate() {
            *v = i as u8;
        }
        Colormap([row; 34])
    }

    /// Fade every palette entry towards black over the 32 light maps.
    pub fn from_palette(palette: &Palette) -> Self {
        let mut maps = Colormap::default();
        for level in 0..NUMCOLORMAPS {
            let keep = (NUMCOLORMAPS - level) as i32;
            for i in 0..256 {
                let [r, g, b] = palette.rgb(i);
                let n = NUMCOLORMAPS as i32;
                maps[level][i] = palette.nearest([r * keep / n, g * keep / n, b * keep / n]);
            }
        }
        for i in 0..256 {
            let [r, g, b] = palette.rgb(i);
            let gray = 255 - (r * 299 + g * 587 + b * 114) / 1000;
            maps[INVERSE_COLORMAP as usize][i] = palette.nearest([gray, gray, gray]);
        }
        let black = palette.nearest([0, 0, 0]);
        maps[INVERSE_COLORMAP as usize + 1] = [black; 256];
        maps
    }
}

/// Player colour remaps for sprites carrying translation bits.
#[derive(Clone)]
pub struct Translations(pub [[u8; 256]; 3]);
impl Default for Translations {
    /// Green ramp (0x70‥0x7F) to gray, brown and red ramps.
    fn default() -> Self {
        let mut t = [[0u8; 256]; 3];
        for i in 0..256 {
            let idx = i as u8;
            if (0x70..=0x7F).contains(&idx) {
                t[0][i] = 0x60 + (idx & 0xF);
                t[1][i] = 0x40 + (idx & 0xF);
                t[2][i] = 0x20 + (idx & 0xF);
            } else {
                t[0][i] = idx;
                t[1][i] = idx;
                t[2][i] = idx;
            }
        }
        Translations(t)
    }
}
impl Translations {
    /// Table for translation bits `n` (1‥3).
    #[inline]
    pub fn table(&self, n: usize) -> &[u8; 256] {
        &self.0[(n.clamp(1, 3)) - 1]
    }
}

/// A palette-agnostic, format-agnostic cache of pictures.
///
/// * Does **not** parse WADs or images; the asset loader fills it.
/// * Stores exactly one copy of every name per namespace
///   (textures/patches, flats, sprites).
/// * Texture id **0** and flat id **0** are the “missing” checkerboards.
///
/// **Thread-safety:** access `TextureBank` from a single thread or wrap it
/// in `RwLock`.
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
    flats_by_name: HashMap<String, FlatId>,
    flats: Vec<Flat>,
    sprites_by_name: HashMap<String, SpriteId>,
    sprites: Vec<SpriteDef>,
    palette: Palette,
    colormap: Colormap,
    translations: Translations,
}

impl TextureBank {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Create an empty bank with a mandatory *missing* texture used as
    /// fallback.  The texture is inserted under the fixed name `"MISSING"`
    /// and obtains the handle **0**; a checker flat takes flat id **0**.
    pub fn new(missing_tex: Texture) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), NO_TEXTURE);
        let mut flats_by_name = HashMap::new();
        flats_by_name.insert("MISSING".into(), NO_FLAT);
        Self {
            by_name,
            data: vec![missing_tex],
            flats_by_name,
            flats: vec![Flat::default()],
            sprites_by_name: HashMap::new(),
            sprites: Vec::new(),
            palette: Palette::default(),
            colormap: Colormap::identity(),
            translations: Translations::default(),
        }
    }

    pub fn default_with_checker() -> Self {
        Self::new(Texture::default())
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_colormap(&mut self, colormap: Colormap) {
        self.colormap = colormap;
    }

    pub fn colormap(&self) -> &Colormap {
        &self.colormap
    }

    pub fn set_translations(&mut self, translations: Translations) {
        self.translations = translations;
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    /// Number of textures stored (including the “missing” one).
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    } // only checker

    /// Obtain the id for a *loaded* texture by name.
    /// Returns `None` if the name is unknown.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    /// Fallback-safe query: unknown names resolve to the checkerboard id.
    pub fn id_or_missing(&self, name: &str) -> TextureId {
        self.id(name).unwrap_or(NO_TEXTURE)
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Out-of-range ids draw as the checkerboard.
    #[inline]
    pub fn texture_or_missing(&self, id: TextureId) -> &Texture {
        self.data.get(id as usize).unwrap_or(&self.data[0])
    }

    /// Mutable borrow (e.g. for post-load patching).
    pub fn texture_mut(&mut self, id: TextureId) -> Result<&mut Texture, TextureError> {
        self.data
            .get_mut(id as usize)
            .ok_or(TextureError::BadId(id))
    }

    pub fn flat_id(&self, name: &str) -> Option<FlatId> {
        self.flats_by_name.get(name).copied()
    }

    #[inline]
    pub fn flat_or_missing(&self, id: FlatId) -> &Flat {
        self.flats.get(id as usize).unwrap_or(&self.flats[0])
    }

    pub fn sprite_id(&self, name: &str) -> Option<SpriteId> {
        self.sprites_by_name.get(name).copied()
    }

    pub fn sprite(&self, id: SpriteId) -> Result<&SpriteDef, TextureError> {
        self.sprites.get(id as usize).ok_or(TextureError::BadSprite(id))
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Insert a texture under `name`.
    ///
    /// * Returns the newly assigned `TextureId`.
    /// * Fails if the name already exists (`Duplicate`).
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        let id = self.data.len() as TextureId;
        self.data.push(tex);
        self.by_name.insert(name, id);
        Ok(id)
    }

    pub fn insert_flat(&mut self, flat: Flat) -> Result<FlatId, TextureError> {
        if self.flats_by_name.contains_key(&flat.name) {
            return Err(TextureError::Duplicate(flat.name));
        }
        let id = self.flats.len() as FlatId;
        self.flats_by_name.insert(flat.name.clone(), id);
        self.flats.push(flat);
        Ok(id)
    }

    pub fn insert_sprite(&mut self, sprite: SpriteDef) -> Result<SpriteId, TextureError> {
        if self.sprites_by_name.contains_key(&sprite.name) {
            return Err(TextureError::Duplicate(sprite.name));
        }
        let id = self.sprites.len() as SpriteId;
        self.sprites_by_name.insert(sprite.name.clone(), id);
        self.sprites.push(sprite);
        Ok(id)
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tex(color: u8) -> Texture {
        Texture::from_fn("Dummy", 2, 2, |_, _| color)
    }

    #[test]
    fn insert_and_lookup() {
        let mut bank = TextureBank::default_with_checker();
        let red = bank.insert("RED", dummy_tex(0x01)).unwrap();
        let blue = bank.insert("BLUE", dummy_tex(0xFF)).unwrap();

        assert_ne!(red, NO_TEXTURE);
        assert_ne!(blue, red);
        assert_eq!(bank.id("RED"), Some(red));
        assert_eq!(bank.id("BLUE"), Some(blue));
        assert_eq!(bank.id("NOPE"), None);

        assert_eq!(bank.texture(red).unwrap().pixel(0, 0), 0x01);
        assert_eq!(bank.texture(blue).unwrap().pixel(1, 1), 0xFF);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut bank = TextureBank::default_with_checker();
        bank.insert("WOOD", dummy_tex(1)).unwrap();
        let err = bank.insert("WOOD", dummy_tex(2)).unwrap_err();
        assert_eq!(err, TextureError::Duplicate("WOOD".into()));
        // texture count still 2 (checker + first WOOD)
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn bad_id_guard() {
        let bank = TextureBank::default_with_checker();
        let bad = TextureId::MAX;
        assert_eq!(bank.texture(bad).unwrap_err(), TextureError::BadId(bad));
        assert_eq!(bank.texture_or_missing(bad).name, "CHECKER");
        assert_eq!(bank.sprite(3).unwrap_err(), TextureError::BadSprite(3));
    }

    #[test]
    fn posts_skip_transparent_texels() {
        // column 0: rows 1-2 and 4 opaque; column 1 fully opaque
        let rows = [
            0, 5, //
            7, 5, //
            7, 5, //
            0, 5, //
            9, 5, //
        ];
        let tex = Texture::from_rows("GRATE", 2, 5, &rows).unwrap();
        assert_eq!(
            tex.posts(0),
            &[Post { top: 1, len: 2 }, Post { top: 4, len: 1 }]
        );
        assert_eq!(tex.posts(1), &[Post { top: 0, len: 5 }]);
        assert_eq!(tex.post_pixels(0, tex.posts(0)[1]), &[9]);
        assert!(tex.is_masked());
        assert!(!dummy_tex(3).is_masked());
    }

    #[test]
    fn columns_wrap_horizontally() {
        let tex = Texture::from_fn("STRIPES", 4, 2, |x, _| x as u8 + 1);
        assert_eq!(tex.column(5), &[2, 2]);
        assert_eq!(tex.column(-1), &[4, 4]);
    }

    #[test]
    fn bad_sizes_rejected() {
        assert!(matches!(
            Texture::from_rows("X", 3, 3, &[1; 8]),
            Err(TextureError::BadSize { expected: 9, got: 8, .. })
        ));
        assert!(Flat::new("F", vec![0; 10]).is_err());
    }

    #[test]
    fn generated_colormaps_darken() {
        let mut pal = Palette::default();
        for i in 0..256 {
            pal[i] = (i as u32) << 16 | (i as u32) << 8 | i as u32;
        }
        let maps = Colormap::from_palette(&pal);
        assert_eq!(maps[0][200], 200);
        assert!(maps[16][200] < 110 && maps[16][200] > 90);
        assert_eq!(maps[33][200], 0);
        assert_eq!(maps[INVERSE_COLORMAP as usize][0], 255);
    }

    #[test]
    fn translations_remap_green_ramp_only() {
        let t = Translations::default();
        assert_eq!(t.table(1)[0x73], 0x63);
        assert_eq!(t.table(3)[0x7F], 0x2F);
        assert_eq!(t.table(2)[0x10], 0x10);
    }
}
