use image::GrayImage;

/// Index order of the three anatomical landmarks in a [`Landmarks`] vector.
///
/// The canonical flat layout is `[x1, x2, x3, y1, y2, y3]` where the point
/// order is superior patella, inferior patella, tibial plateau. This matches
/// the column order of the label table.
pub const LANDMARK_NAMES: [&str; 3] = ["superior_patella", "inferior_patella", "tibial_plateau"];

/// Three anatomical landmark coordinates in the frame of one radiograph.
///
/// Coordinates are stored in the canonical flat order
/// `[x1, x2, x3, y1, y2, y3]`. Every geometric adjustment returns a new
/// `Landmarks`; nothing mutates in place, so a label vector can never drift
/// out of sync with an image it no longer describes.
///
/// # Examples
/// ```ignore
/// let lm = Landmarks::new([300.0, 310.0, 320.0, 400.0, 500.0, 600.0]);
/// assert_eq!(lm.superior_patella(), (300.0, 400.0));
/// let shifted = lm.translate_y(-100.0);
/// assert_eq!(shifted.superior_patella(), (300.0, 300.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks([f64; 6]);

impl Landmarks {
    /// Creates a landmark vector from the canonical flat order.
    pub fn new(values: [f64; 6]) -> Self {
        Self(values)
    }

    /// Creates a landmark vector from three `(x, y)` points in canonical
    /// point order (superior patella, inferior patella, tibial plateau).
    pub fn from_points(points: [(f64, f64); 3]) -> Self {
        Self([
            points[0].0,
            points[1].0,
            points[2].0,
            points[0].1,
            points[1].1,
            points[2].1,
        ])
    }

    /// Returns the canonical flat representation `[x1, x2, x3, y1, y2, y3]`.
    pub fn to_array(&self) -> [f64; 6] {
        self.0
    }

    /// Returns the three `(x, y)` points in canonical point order.
    pub fn points(&self) -> [(f64, f64); 3] {
        [
            (self.0[0], self.0[3]),
            (self.0[1], self.0[4]),
            (self.0[2], self.0[5]),
        ]
    }

    pub fn superior_patella(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    pub fn inferior_patella(&self) -> (f64, f64) {
        (self.0[1], self.0[4])
    }

    pub fn tibial_plateau(&self) -> (f64, f64) {
        (self.0[2], self.0[5])
    }

    /// Applies `f` to every point and returns the adjusted vector.
    ///
    /// This is the single funnel for coordinate math: crops, rescales and
    /// augmentations all express their landmark update through it.
    pub fn map_points<F>(&self, f: F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        let p = self.points();
        Self::from_points([
            f(p[0].0, p[0].1),
            f(p[1].0, p[1].1),
            f(p[2].0, p[2].1),
        ])
    }

    /// Shifts every x coordinate by `dx`, leaving y untouched.
    pub fn translate_x(&self, dx: f64) -> Self {
        self.map_points(|x, y| (x + dx, y))
    }

    /// Shifts every y coordinate by `dy`, leaving x untouched.
    pub fn translate_y(&self, dy: f64) -> Self {
        self.map_points(|x, y| (x, y + dy))
    }

    /// Scales x by `sx` and y by `sy`.
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        self.map_points(|x, y| (x * sx, y * sy))
    }
}

/// One dataset element: a radiograph and the landmarks in its frame.
///
/// The pair is the unit that flows through the pipeline. Geometric stages
/// consume the whole `Sample` and return a new one, so image and labels are
/// transformed in the same call and can never be updated independently.
#[derive(Debug, Clone)]
pub struct Sample {
    image: GrayImage,
    landmarks: Landmarks,
}

impl Sample {
    pub fn new(image: GrayImage, landmarks: Landmarks) -> Self {
        Self { image, landmarks }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    /// Image dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Splits the sample into its owned parts for a joint transform.
    pub fn into_parts(self) -> (GrayImage, Landmarks) {
        (self.image, self.landmarks)
    }
}
