/// Composition instruction. The first input image is nested inside the second.
pub const NESTING_PROMPT: &str = "\
Create a Droste-style image where the first image in the array appears as a smaller poster within the second image in the array.
Keep the entire composition and all objects of the second image exactly in the same place. Do not rearrange or distort them.
The second image should remain fully visible and unchanged, serving as the main background.
Place the first image inside it as a smaller printed poster, painting, or framed image that looks naturally integrated into the scene.
The first image should appear smaller and contained within the second image, preserving the perspective and lighting of the second image.
Do not modify or move any subjects or elements of the second image, only overlay the first image inside it.
Ensure the entire frame is filled with the second image, with the first image clearly visible inside it, like a poster within a poster.";

/// Analysis instruction asking for the bounding box of the first image inside the second.
pub const PLACEMENT_PROMPT: &str = r#"I have 2 images:
1. BEFORE, the first image in the image_input array: the image to be searched for.
2. AFTER, the second image in the image_input array: the result after inserting the BEFORE image into a new scene.

Find where the BEFORE image is located within the AFTER image. Return ONLY a JSON object with the bounding box coordinates as percentages (0-100) of the image dimensions:

{
  "placement": {
    "x": number (left edge as % from left),
    "y": number (top edge as % from top),
    "width": number (width as % of total width),
    "height": number (height as % of total height),
    "centerX": number (center X as % from left),
    "centerY": number (center Y as % from top),
    "description": "brief description of where it was placed",
    "confidence": number (0-1, how confident you are)
  }
}"#;
